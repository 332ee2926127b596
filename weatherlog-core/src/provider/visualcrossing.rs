use reqwest::Client;
use serde::Deserialize;

use crate::model::HistoricalDay;

use super::{FetchError, get_json, trim_base_url};

pub const DEFAULT_BASE_URL: &str = "https://weather.visualcrossing.com";

const TIMELINE: &str = "Visual Crossing timeline";

#[derive(Debug, Clone)]
pub struct VisualCrossingProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl VisualCrossingProvider {
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

    fn timeline_url(&self, location: &str, start: &str, end: &str) -> String {
        format!(
            "{}/VisualCrossingWebServices/rest/services/timeline/{}/{}/{}",
            self.base_url,
            urlencoding::encode(location),
            urlencoding::encode(start),
            urlencoding::encode(end),
        )
    }

    /// Daily summaries for `start..=end`.
    pub async fn timeline(
        &self,
        location: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<HistoricalDay>, FetchError> {
        let url = self.timeline_url(location, start, end);
        tracing::debug!(%url, "requesting historical timeline");

        let request = self.http.get(url).query(&[
            ("key", self.api_key.as_str()),
            ("unitGroup", "us"),
            ("include", "days"),
            ("contentType", "json"),
        ]);

        let parsed: VcResponse = get_json(request, TIMELINE).await?;
        let days = parsed
            .days
            .ok_or(FetchError::MissingField {
                service: TIMELINE,
                field: "days",
            })?;

        Ok(days
            .into_iter()
            .map(|day| HistoricalDay {
                location_name: parsed.resolved_address.clone(),
                date: day.datetime,
                temperature_f: day.temp,
                condition: day.conditions,
                humidity_pct: day.humidity,
                wind_speed_mph: day.windspeed,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VcResponse {
    resolved_address: Option<String>,
    days: Option<Vec<VcDay>>,
}

#[derive(Debug, Deserialize)]
struct VcDay {
    datetime: String,
    temp: Option<f64>,
    conditions: Option<String>,
    humidity: Option<f64>,
    windspeed: Option<f64>,
}
