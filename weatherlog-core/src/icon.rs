use serde::{Deserialize, Serialize};

/// Wind speed (mph) from which an otherwise unremarkable day counts as windy.
pub const WINDY_THRESHOLD_MPH: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeatherIcon {
    Sunny,
    Stormy,
    Rainy,
    Snowy,
    Cloudy,
    Windy,
    PartlyCloudy,
}

impl WeatherIcon {
    /// Pick an icon from the provider's condition text. First match wins.
    pub fn select(condition: &str, wind_speed_mph: Option<f64>) -> Self {
        let condition = condition.to_lowercase();

        if condition.contains("clear") {
            Self::Sunny
        } else if condition.contains("thunder") || condition.contains("storm") {
            Self::Stormy
        } else if condition.contains("rain") {
            Self::Rainy
        } else if condition.contains("snow") {
            Self::Snowy
        } else if condition.contains("overcast") {
            Self::Cloudy
        } else if wind_speed_mph.is_some_and(|w| w >= WINDY_THRESHOLD_MPH) {
            Self::Windy
        } else {
            Self::PartlyCloudy
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Stormy => "stormy",
            Self::Rainy => "rainy",
            Self::Snowy => "snowy",
            Self::Cloudy => "cloudy",
            Self::Windy => "windy",
            Self::PartlyCloudy => "partlyCloudy",
        }
    }

    /// Single-glyph form for terminal output.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Sunny => "☀",
            Self::Stormy => "⛈",
            Self::Rainy => "🌧",
            Self::Snowy => "❄",
            Self::Cloudy => "☁",
            Self::Windy => "🌬",
            Self::PartlyCloudy => "⛅",
        }
    }
}
