use crate::{
    Config,
    model::{ForecastEntry, HistoricalDay, WeatherSnapshot},
    provider::{
        ipinfo::IpInfoProvider, openweather::OpenWeatherProvider,
        visualcrossing::VisualCrossingProvider,
    },
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug};
use thiserror::Error;

pub mod ipinfo;
pub mod openweather;
pub mod visualcrossing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    VisualCrossing,
    IpInfo,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::VisualCrossing => "visualcrossing",
            ProviderId::IpInfo => "ipinfo",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::VisualCrossing, ProviderId::IpInfo]
    }

    /// What the provider is used for, shown when prompting for a key.
    pub fn purpose(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "current weather and 5-day forecast",
            ProviderId::VisualCrossing => "historical weather",
            ProviderId::IpInfo => "location auto-detection",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "visualcrossing" => Ok(ProviderId::VisualCrossing),
            "ipinfo" => Ok(ProviderId::IpInfo),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. \
                 Supported providers: openweather, visualcrossing, ipinfo."
            )),
        }
    }
}

/// Why a provider call failed. Callers that only care about success may
/// treat every variant alike.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{provider} is not configured. Hint: run `weatherlog configure {provider}`.")]
    NotConfigured { provider: ProviderId },

    #[error("{service} request failed: {source}")]
    Network {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned status {status}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} returned a malformed payload: {source}")]
    Malformed {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{service} found no match for {query:?}")]
    NoResults { service: &'static str, query: String },

    #[error("{service} response is missing `{field}`")]
    MissingField {
        service: &'static str,
        field: &'static str,
    },
}

/// Access to every external weather and location source the app needs.
#[async_trait]
pub trait WeatherGateway: Send + Sync + Debug {
    /// Current conditions plus the raw 5-day/3-hour forecast for a canonical location.
    async fn current_and_forecast(
        &self,
        location: &str,
    ) -> Result<(WeatherSnapshot, Vec<ForecastEntry>), FetchError>;

    /// One entry per day in `start..=end` (both `YYYY-MM-DD`).
    async fn historical(
        &self,
        location: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<HistoricalDay>, FetchError>;

    /// `(city, country)` of the caller's network origin.
    async fn resolve_current_location(&self) -> Result<(String, String), FetchError>;
}

/// Gateway backed by the public HTTP APIs. A provider without an API key is
/// left out and reported as [`FetchError::NotConfigured`] when needed.
#[derive(Debug, Clone, Default)]
pub struct HttpGateway {
    openweather: Option<OpenWeatherProvider>,
    visualcrossing: Option<VisualCrossingProvider>,
    ipinfo: Option<IpInfoProvider>,
}

impl HttpGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_openweather(mut self, provider: OpenWeatherProvider) -> Self {
        self.openweather = Some(provider);
        self
    }

    pub fn with_visualcrossing(mut self, provider: VisualCrossingProvider) -> Self {
        self.visualcrossing = Some(provider);
        self
    }

    pub fn with_ipinfo(mut self, provider: IpInfoProvider) -> Self {
        self.ipinfo = Some(provider);
        self
    }
}

#[async_trait]
impl WeatherGateway for HttpGateway {
    async fn current_and_forecast(
        &self,
        location: &str,
    ) -> Result<(WeatherSnapshot, Vec<ForecastEntry>), FetchError> {
        let provider = self
            .openweather
            .as_ref()
            .ok_or(FetchError::NotConfigured { provider: ProviderId::OpenWeather })?;
        provider.current_and_forecast(location).await
    }

    async fn historical(
        &self,
        location: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<HistoricalDay>, FetchError> {
        let provider = self
            .visualcrossing
            .as_ref()
            .ok_or(FetchError::NotConfigured { provider: ProviderId::VisualCrossing })?;
        provider.timeline(location, start, end).await
    }

    async fn resolve_current_location(&self) -> Result<(String, String), FetchError> {
        let provider =
            self.ipinfo.as_ref().ok_or(FetchError::NotConfigured { provider: ProviderId::IpInfo })?;
        provider.lookup().await
    }
}

/// Build the HTTP gateway from whatever providers the config has keys for.
pub fn gateway_from_config(config: &Config) -> anyhow::Result<HttpGateway> {
    let http = Client::builder().timeout(config.http.timeout()).build()?;
    let mut gateway = HttpGateway::new();

    for &id in ProviderId::all() {
        if !config.is_provider_configured(id) {
            tracing::debug!("Provider {id} has no API key; leaving it out");
            continue;
        }
        let api_key = config.require_api_key(id)?.to_owned();
        let base_url = config.provider_base_url(id);

        gateway = match id {
            ProviderId::OpenWeather => {
                let mut p = OpenWeatherProvider::new(api_key, http.clone());
                if let Some(url) = base_url {
                    p = p.with_base_url(url);
                }
                gateway.with_openweather(p)
            }
            ProviderId::VisualCrossing => {
                let mut p = VisualCrossingProvider::new(api_key, http.clone());
                if let Some(url) = base_url {
                    p = p.with_base_url(url);
                }
                gateway.with_visualcrossing(p)
            }
            ProviderId::IpInfo => {
                let mut p = IpInfoProvider::new(api_key, http.clone());
                if let Some(url) = base_url {
                    p = p.with_base_url(url);
                }
                gateway.with_ipinfo(p)
            }
        };
    }

    Ok(gateway)
}

/// Send a request and decode a JSON body. Status codes and bodies only go to the debug log.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    service: &'static str,
) -> Result<T, FetchError> {
    let res = request.send().await.map_err(|source| FetchError::Network { service, source })?;

    let status = res.status();
    let body = res.text().await.map_err(|source| FetchError::Network { service, source })?;
    tracing::debug!(service, %status, body = %truncate_body(&body), "provider response");

    if !status.is_success() {
        tracing::warn!(service, %status, "provider request failed");
        return Err(FetchError::Status {
            service,
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    serde_json::from_str(&body).map_err(|source| FetchError::Malformed { service, source })
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

pub(crate) fn trim_base_url(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_string()
}
