//! Request lifecycle: normalize the location, pick a back-end, persist the
//! outcome and hand everything to the renderer.

use chrono::{Local, NaiveDate};
use thiserror::Error;

use crate::{
    forecast::{group_by_day, select_display_window},
    location::{self, NormalizeError},
    model::{ForecastBucket, HistoricalDay, WeatherRequestRecord, WeatherSnapshot},
    provider::{FetchError, WeatherGateway},
    store::{RequestHistoryStore, StoreError},
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Failures surfaced to the user. The wrapped sources are diagnostic detail.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Invalid location format. Use 'City, Country' or 'City, State, Country'.")]
    InvalidLocationFormat(#[source] NormalizeError),

    #[error("Unable to determine your location.")]
    LocationUnavailable(#[source] FetchError),

    #[error("Unable to fetch weather data.")]
    CurrentFetchFailed(#[source] FetchError),

    #[error("Unable to fetch historical weather data.")]
    HistoricalFetchFailed(#[source] FetchError),

    #[error("No history record with id {0}.")]
    NotFound(i64),

    #[error("History store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for RequestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => RequestError::NotFound(id),
            StoreError::Unavailable(msg) => RequestError::StoreUnavailable(msg),
        }
    }
}

/// Where results go. Implemented by whatever UI drives the orchestrator.
pub trait Renderer {
    fn show_current(&self, snapshot: &WeatherSnapshot, forecast: &[ForecastBucket]);
    fn show_historical(&self, location: &str, days: &[HistoricalDay]);
    fn show_records(&self, records: &[WeatherRequestRecord]);
    fn show_error(&self, error: &RequestError);
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Normalizing,
    Fetching,
    Aggregating,
    Persisting,
    Displaying,
}

/// Weather data as handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherView {
    Current {
        snapshot: WeatherSnapshot,
        forecast: Vec<ForecastBucket>,
    },
    Historical {
        location: String,
        days: Vec<HistoricalDay>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    /// Canonical location every provider call used.
    pub location: String,
    pub view: WeatherView,
    /// Ids of the history records created for this request.
    pub created: Vec<i64>,
}

pub struct RequestOrchestrator<'a> {
    gateway: &'a dyn WeatherGateway,
    store: &'a dyn RequestHistoryStore,
    renderer: &'a dyn Renderer,
    clock: &'a dyn Clock,
    state: RequestState,
}

impl<'a> RequestOrchestrator<'a> {
    pub fn new(
        gateway: &'a dyn WeatherGateway,
        store: &'a dyn RequestHistoryStore,
        renderer: &'a dyn Renderer,
    ) -> Self {
        Self {
            gateway,
            store,
            renderer,
            clock: &SystemClock,
            state: RequestState::Idle,
        }
    }

    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    fn transition(&mut self, next: RequestState) {
        tracing::trace!(from = ?self.state, to = ?next, "request state");
        self.state = next;
    }

    fn fail(&mut self, err: RequestError) -> RequestError {
        tracing::warn!(error = %err, "request failed");
        tracing::debug!(error = ?err, "request failure detail");
        self.renderer.show_error(&err);
        self.transition(RequestState::Idle);
        err
    }

    fn today(&self) -> String {
        self.clock.today().format(DATE_FORMAT).to_string()
    }

    /// Handle a new request from the input form. Empty dates (or `auto`)
    /// select current weather; two non-empty dates select the historical range.
    pub async fn submit(
        &mut self,
        raw_location: &str,
        raw_start: &str,
        raw_end: &str,
    ) -> Result<SubmitOutcome, RequestError> {
        tracing::info!(location = raw_location, start = raw_start, end = raw_end, "submit");
        self.transition(RequestState::Normalizing);

        let query = match location::normalize(raw_location) {
            Ok(query) => query,
            Err(err) => return Err(self.fail(RequestError::InvalidLocationFormat(err))),
        };

        let (location, start, end) = if query.is_auto_detect() {
            self.transition(RequestState::Fetching);
            let resolved = self.gateway.resolve_current_location().await;
            match resolved {
                Ok((city, country)) => {
                    tracing::info!(%city, %country, "auto-detected location");
                    (format!("{city}, {country}"), "", "")
                }
                Err(err) => return Err(self.fail(RequestError::LocationUnavailable(err))),
            }
        } else {
            (query.canonical_form().to_string(), raw_start.trim(), raw_end.trim())
        };
        tracing::debug!(%location, "normalized location");

        let result = if !start.is_empty() && !end.is_empty() {
            self.submit_historical(&location, start, end).await
        } else {
            self.submit_current(&location).await
        };

        match result {
            Ok((view, created)) => {
                self.refresh_records()?;
                self.transition(RequestState::Idle);
                Ok(SubmitOutcome { location, view, created })
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    async fn submit_historical(
        &mut self,
        location: &str,
        start: &str,
        end: &str,
    ) -> Result<(WeatherView, Vec<i64>), RequestError> {
        self.transition(RequestState::Fetching);
        let days = self
            .gateway
            .historical(location, start, end)
            .await
            .map_err(RequestError::HistoricalFetchFailed)?;

        self.transition(RequestState::Persisting);
        let mut created = Vec::with_capacity(days.len());
        for day in &days {
            created.push(self.store.create(location, &day.date, &day.formatted_temperature())?);
        }

        self.transition(RequestState::Displaying);
        self.renderer.show_historical(location, &days);

        Ok((
            WeatherView::Historical {
                location: location.to_string(),
                days,
            },
            created,
        ))
    }

    async fn submit_current(
        &mut self,
        location: &str,
    ) -> Result<(WeatherView, Vec<i64>), RequestError> {
        let (snapshot, forecast) = self.fetch_current(location).await?;

        self.transition(RequestState::Persisting);
        let id = self.store.create(location, &self.today(), &snapshot.formatted_temperature())?;

        self.transition(RequestState::Displaying);
        self.renderer.show_current(&snapshot, &forecast);

        Ok((WeatherView::Current { snapshot, forecast }, vec![id]))
    }

    /// Fetch current weather and reduce the forecast to the display window.
    async fn fetch_current(
        &mut self,
        location: &str,
    ) -> Result<(WeatherSnapshot, Vec<ForecastBucket>), RequestError> {
        self.transition(RequestState::Fetching);
        let (snapshot, entries) = self
            .gateway
            .current_and_forecast(location)
            .await
            .map_err(RequestError::CurrentFetchFailed)?;

        self.transition(RequestState::Aggregating);
        let buckets = group_by_day(entries);
        let window = select_display_window(&buckets).to_vec();

        Ok((snapshot, window))
    }

    /// Show a stored record again. Records dated today are re-fetched live,
    /// older ones from the historical endpoint. Never writes to the history.
    pub async fn replay(&mut self, record_id: i64) -> Result<WeatherView, RequestError> {
        let record = match self.store.read_by_id(record_id) {
            Ok(record) => record,
            Err(err) => return Err(self.fail(err.into())),
        };
        tracing::info!(id = record.id, location = %record.location, date = %record.date, "replay");

        let view = if record.date == self.today() {
            self.fetch_current(&record.location)
                .await
                .map(|(snapshot, forecast)| WeatherView::Current { snapshot, forecast })
        } else {
            self.transition(RequestState::Fetching);
            self.gateway
                .historical(&record.location, &record.date, &record.date)
                .await
                .map(|days| WeatherView::Historical {
                    location: record.location.clone(),
                    days,
                })
                .map_err(RequestError::HistoricalFetchFailed)
        };

        let view = match view {
            Ok(view) => view,
            Err(err) => return Err(self.fail(err)),
        };

        self.transition(RequestState::Displaying);
        match &view {
            WeatherView::Current { snapshot, forecast } => {
                self.renderer.show_current(snapshot, forecast)
            }
            WeatherView::Historical { location, days } => {
                self.renderer.show_historical(location, days)
            }
        }
        self.transition(RequestState::Idle);

        Ok(view)
    }

    /// Re-read the history and hand it to the renderer.
    pub fn refresh_records(&mut self) -> Result<Vec<WeatherRequestRecord>, RequestError> {
        match self.store.read_all() {
            Ok(records) => {
                self.renderer.show_records(&records);
                Ok(records)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    pub fn update_temperature(
        &mut self,
        record_id: i64,
        temperature: &str,
    ) -> Result<(), RequestError> {
        if let Err(err) = self.store.update(record_id, temperature.trim()) {
            return Err(self.fail(err.into()));
        }
        tracing::info!(id = record_id, temperature, "temperature updated");
        self.refresh_records().map(|_| ())
    }

    pub fn delete_record(&mut self, record_id: i64) -> Result<(), RequestError> {
        if let Err(err) = self.store.delete(record_id) {
            return Err(self.fail(err.into()));
        }
        tracing::info!(id = record_id, "record deleted");
        self.refresh_records().map(|_| ())
    }
}
