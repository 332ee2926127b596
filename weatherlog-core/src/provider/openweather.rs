use reqwest::Client;
use serde::Deserialize;

use crate::model::{ForecastEntry, WeatherSnapshot};

use super::{FetchError, get_json, trim_base_url};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const GEOCODING: &str = "OpenWeather geocoding";
const CURRENT: &str = "OpenWeather current weather";
const FORECAST: &str = "OpenWeather forecast";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Coordinates {
    lat: f64,
    lon: f64,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, http: Client) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    /// Geocode, then fetch current conditions and the forecast. Both must succeed.
    pub async fn current_and_forecast(
        &self,
        location: &str,
    ) -> Result<(WeatherSnapshot, Vec<ForecastEntry>), FetchError> {
        let coords = self.geocode(location).await?;
        tracing::debug!(location, lat = coords.lat, lon = coords.lon, "geocoded location");

        let current = self.fetch_current(coords).await?;
        let forecast = self.fetch_forecast(coords).await?;
        Ok((current, forecast))
    }

    async fn geocode(&self, location: &str) -> Result<Coordinates, FetchError> {
        let request = self.http.get(format!("{}/geo/1.0/direct", self.base_url)).query(&[
            ("q", location),
            ("limit", "1"),
            ("appid", self.api_key.as_str()),
        ]);

        let matches: Vec<OwGeoMatch> = get_json(request, GEOCODING).await?;
        let first = matches.into_iter().next().ok_or_else(|| FetchError::NoResults {
            service: GEOCODING,
            query: location.to_string(),
        })?;

        Ok(Coordinates { lat: first.lat, lon: first.lon })
    }

    fn coordinate_query(&self, coords: Coordinates) -> [(&'static str, String); 4] {
        [
            ("lat", coords.lat.to_string()),
            ("lon", coords.lon.to_string()),
            ("appid", self.api_key.clone()),
            ("units", "imperial".to_string()),
        ]
    }

    async fn fetch_current(&self, coords: Coordinates) -> Result<WeatherSnapshot, FetchError> {
        let request = self
            .http
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&self.coordinate_query(coords));

        let parsed: OwCurrentResponse = get_json(request, CURRENT).await?;

        Ok(WeatherSnapshot {
            location_name: parsed.name,
            temperature_f: parsed.main.temp,
            condition: first_description(parsed.weather),
            humidity_pct: parsed.main.humidity,
            wind_speed_mph: parsed.wind.speed,
        })
    }

    async fn fetch_forecast(&self, coords: Coordinates) -> Result<Vec<ForecastEntry>, FetchError> {
        let request = self
            .http
            .get(format!("{}/data/2.5/forecast", self.base_url))
            .query(&self.coordinate_query(coords));

        let parsed: OwForecastResponse = get_json(request, FORECAST).await?;

        Ok(parsed
            .list
            .into_iter()
            .map(|entry| ForecastEntry {
                timestamp: entry.dt_txt,
                temperature_f: entry.main.temp,
                condition: first_description(entry.weather),
                humidity_pct: entry.main.humidity,
                wind_speed_mph: entry.wind.speed,
            })
            .collect())
    }
}

fn first_description(weather: Vec<OwWeather>) -> Option<String> {
    weather.into_iter().next().and_then(|w| w.description)
}

#[derive(Debug, Deserialize)]
struct OwGeoMatch {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: Option<String>,
    #[serde(default)]
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    #[serde(default)]
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_payload_with_missing_fields_maps_to_unknowns() {
        let parsed: OwCurrentResponse =
            serde_json::from_str(r#"{"name":"Seattle","main":{"temp":51.3}}"#).unwrap();

        assert_eq!(parsed.name.as_deref(), Some("Seattle"));
        assert_eq!(parsed.main.temp, Some(51.3));
        assert_eq!(parsed.main.humidity, None);
        assert_eq!(parsed.wind.speed, None);
        assert_eq!(first_description(parsed.weather), None);
    }

    #[test]
    fn integer_humidity_is_accepted() {
        let parsed: OwForecastResponse = serde_json::from_str(
            r#"{"list":[{"dt_txt":"2024-01-01 00:00:00","main":{"temp":40,"humidity":81},
                "weather":[{"description":"light rain"}],"wind":{"speed":4.1}}]}"#,
        )
        .unwrap();

        let entry = &parsed.list[0];
        assert_eq!(entry.main.humidity, Some(81.0));
        assert_eq!(entry.main.temp, Some(40.0));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider =
            OpenWeatherProvider::new("KEY".into(), Client::new()).with_base_url("http://x/");
        assert_eq!(provider.base_url, "http://x");
    }
}
