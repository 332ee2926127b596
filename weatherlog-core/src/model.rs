use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Placeholder shown and persisted when a provider omitted a measurement.
pub const UNKNOWN: &str = "unknown";

/// A single point-in-time reading. Measurements the provider did not send are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: Option<String>,
    pub temperature_f: Option<f64>,
    pub condition: Option<String>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_mph: Option<f64>,
}

impl WeatherSnapshot {
    /// Temperature in the form stored in history, e.g. `72°F`.
    pub fn formatted_temperature(&self) -> String {
        format_temperature(self.temperature_f)
    }
}

/// One sample of the 3-hourly forecast list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
    pub temperature_f: Option<f64>,
    pub condition: Option<String>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_mph: Option<f64>,
}

impl ForecastEntry {
    /// Calendar date portion of the timestamp.
    pub fn date_key(&self) -> &str {
        self.timestamp.get(..10).unwrap_or(&self.timestamp)
    }
}

/// Forecast entries sharing one calendar date, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBucket {
    pub date: String,
    pub entries: Vec<ForecastEntry>,
}

impl ForecastBucket {
    /// The sample displayed for the whole day.
    pub fn representative(&self) -> Option<&ForecastEntry> {
        self.entries.first()
    }
}

/// One day returned by the historical timeline endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDay {
    pub location_name: Option<String>,
    /// `YYYY-MM-DD`
    pub date: String,
    pub temperature_f: Option<f64>,
    pub condition: Option<String>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_mph: Option<f64>,
}

impl HistoricalDay {
    pub fn formatted_temperature(&self) -> String {
        format_temperature(self.temperature_f)
    }
}

/// A persisted row of the request history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRequestRecord {
    pub id: i64,
    pub location: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub temperature: String,
    pub created_at: NaiveDateTime,
}

pub fn format_temperature(value: Option<f64>) -> String {
    match value {
        Some(t) => format!("{t}°F"),
        None => UNKNOWN.to_string(),
    }
}
