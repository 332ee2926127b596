use std::{error::Error, fmt::Display};

use chrono::NaiveDate;
use weatherlog_core::{
    ForecastBucket, HistoricalDay, Renderer, RequestError, WeatherIcon, WeatherRequestRecord,
    WeatherSnapshot, model::UNKNOWN,
};

/// Prints results to stdout and errors to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalRenderer;

fn or_unknown<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| UNKNOWN.to_string())
}

fn with_unit<T: Display>(value: Option<T>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v}{unit}"),
        None => UNKNOWN.to_string(),
    }
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn condition_line(condition: Option<&str>, wind: Option<f64>) -> String {
    let icon = WeatherIcon::select(condition.unwrap_or_default(), wind);
    tracing::debug!(icon = icon.key(), ?condition, ?wind, "selected weather icon");
    format!("{} {}", icon.glyph(), condition.map_or_else(|| UNKNOWN.to_string(), title_case))
}

/// `2024-06-03` as `Mon, Jun 03`; other text is shown unchanged.
fn display_date(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%a, %b %d").to_string())
        .unwrap_or_else(|_| date.to_string())
}

impl Renderer for TerminalRenderer {
    fn show_current(&self, snapshot: &WeatherSnapshot, forecast: &[ForecastBucket]) {
        println!("Today's Weather");
        println!("  Location:    {}", or_unknown(snapshot.location_name.as_deref()));
        println!("  Temperature: {}", snapshot.formatted_temperature());
        println!(
            "  Weather:     {}",
            condition_line(snapshot.condition.as_deref(), snapshot.wind_speed_mph)
        );
        println!("  Humidity:    {}", with_unit(snapshot.humidity_pct, "%"));
        println!("  Wind:        {}", with_unit(snapshot.wind_speed_mph, " mph"));

        if forecast.is_empty() {
            return;
        }

        println!();
        println!("Forecast");
        for bucket in forecast {
            let Some(entry) = bucket.representative() else {
                continue;
            };
            println!(
                "  {:<12} {:>9}  {:>5}  {:>9}  {}",
                display_date(&bucket.date),
                with_unit(entry.temperature_f, "°F"),
                with_unit(entry.humidity_pct, "%"),
                with_unit(entry.wind_speed_mph, " mph"),
                condition_line(entry.condition.as_deref(), entry.wind_speed_mph),
            );
        }
    }

    fn show_historical(&self, location: &str, days: &[HistoricalDay]) {
        if days.is_empty() {
            println!("No historical data for {location}.");
            return;
        }

        for day in days {
            println!("{}", day.date);
            println!(
                "  Location:    {}",
                day.location_name.as_deref().unwrap_or(location)
            );
            println!("  Temperature: {}", day.formatted_temperature());
            println!(
                "  Weather:     {}",
                condition_line(day.condition.as_deref(), day.wind_speed_mph)
            );
            println!("  Humidity:    {}", with_unit(day.humidity_pct, "%"));
            println!("  Wind:        {}", with_unit(day.wind_speed_mph, " mph"));
        }
    }

    fn show_records(&self, records: &[WeatherRequestRecord]) {
        println!();
        if records.is_empty() {
            println!("History is empty.");
            return;
        }

        let width = records.iter().map(|r| r.location.chars().count()).max().unwrap_or(0).max(8);
        println!(
            "{:>5}  {:<width$}  {:<10}  {:<12}  Created",
            "ID", "Location", "Date", "Temperature"
        );
        for r in records {
            println!(
                "{:>5}  {:<width$}  {:<10}  {:<12}  {}",
                r.id,
                r.location,
                r.date,
                r.temperature,
                r.created_at.format("%Y-%m-%d %H:%M"),
            );
        }
    }

    fn show_error(&self, error: &RequestError) {
        eprintln!("Error: {error}");
        if let Some(source) = error.source() {
            eprintln!("  caused by: {source}");
        }
    }
}
