//! Core library for the `weatherlog` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Location normalization and the weather/geolocation providers
//! - Forecast grouping and icon selection
//! - The SQLite request history and the orchestrator that ties it all together
//!
//! It is used by `weatherlog-cli`, but any UI that implements [`Renderer`] can drive it.

pub mod config;
pub mod forecast;
pub mod icon;
pub mod location;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod store;

pub use config::{Config, HttpConfig, ProviderConfig, StorageConfig};
pub use icon::WeatherIcon;
pub use location::{LocationQuery, NormalizeError, normalize};
pub use model::{
    ForecastBucket, ForecastEntry, HistoricalDay, WeatherRequestRecord, WeatherSnapshot,
};
pub use orchestrator::{
    Clock, Renderer, RequestError, RequestOrchestrator, RequestState, SubmitOutcome, SystemClock,
    WeatherView,
};
pub use provider::{FetchError, HttpGateway, ProviderId, WeatherGateway, gateway_from_config};
pub use store::{RequestHistoryStore, SqliteHistoryStore, StoreError};
