use reqwest::Client;
use serde::Deserialize;

use super::{FetchError, get_json, trim_base_url};

pub const DEFAULT_BASE_URL: &str = "https://ipinfo.io";

const SERVICE: &str = "ipinfo";

/// Resolves the caller's network origin to a city and country.
#[derive(Debug, Clone)]
pub struct IpInfoProvider {
    token: String,
    base_url: String,
    http: Client,
}

impl IpInfoProvider {
    pub fn new(token: String, http: Client) -> Self {
        Self {
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    pub async fn lookup(&self) -> Result<(String, String), FetchError> {
        let request = self
            .http
            .get(format!("{}/json", self.base_url))
            .query(&[("token", self.token.as_str())]);

        let parsed: IpInfoResponse = get_json(request, SERVICE).await?;
        let city = non_empty(parsed.city)
            .ok_or(FetchError::MissingField {
                service: SERVICE,
                field: "city",
            })?;
        let country = non_empty(parsed.country)
            .ok_or(FetchError::MissingField {
                service: SERVICE,
                field: "country",
            })?;

        Ok((city, country))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
struct IpInfoResponse {
    city: Option<String>,
    country: Option<String>,
}
