//! Observable weather state and the loads that feed it.
//!
//! [`WeatherSync`] is the only writer of every field. Each field is its own
//! `watch` channel, so a subscriber sees each value as it is published and
//! fields update independently of one another.
//!
//! Every load captures the selection generation when it starts. If
//! [`WeatherSync::begin_selection`] was called again before the load
//! finished, its result is dropped instead of overwriting newer data.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    alerts::{self, Notifier},
    client::WeatherClient,
    error::RemoteError,
    location::LocationResolver,
    model::{AirQualitySample, Coordinates, CurrentWeather, ForecastPoint, Preferences},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadSource {
    Weather,
    Forecast,
    AirQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Status(u16),
    Decode,
    /// The location needed for the load could not be resolved.
    Resolution,
}

impl From<&RemoteError> for FailureKind {
    fn from(err: &RemoteError) -> Self {
        match err {
            RemoteError::Transport { .. } => FailureKind::Transport,
            RemoteError::Status { status, .. } => FailureKind::Status(*status),
            RemoteError::Decode { .. } => FailureKind::Decode,
        }
    }
}

/// Why the most recent failed load left its field empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadFailure {
    pub source: LoadSource,
    pub kind: FailureKind,
}

/// Point-in-time copy of every field.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    pub weather: Option<CurrentWeather>,
    pub forecast: Vec<ForecastPoint>,
    pub air_quality: Option<AirQualitySample>,
    pub forecast_loading: bool,
    pub preferences: Preferences,
    pub last_error: Option<LoadFailure>,
}

/// A single load, for launching on the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadRequest {
    Weather(Coordinates),
    WeatherByCity(String),
    Forecast(String),
    ForecastByCoordinates(Coordinates),
    AirQuality(Coordinates),
}

impl LoadRequest {
    fn loads_forecast(&self) -> bool {
        matches!(self, Self::Forecast(_) | Self::ForecastByCoordinates(_))
    }
}

#[derive(Debug)]
pub struct WeatherSync {
    client: Arc<dyn WeatherClient>,
    notifier: Arc<dyn Notifier>,
    generation: AtomicU64,
    forecast_loading: Arc<ForecastLoading>,
    weather: watch::Sender<Option<CurrentWeather>>,
    forecast: watch::Sender<Vec<ForecastPoint>>,
    air_quality: watch::Sender<Option<AirQualitySample>>,
    preferences: watch::Sender<Preferences>,
    last_error: watch::Sender<Option<LoadFailure>>,
}

/// In-flight forecast count behind the `forecast_loading` flag.
#[derive(Debug)]
struct ForecastLoading {
    in_flight: Mutex<usize>,
    flag: watch::Sender<bool>,
}

impl ForecastLoading {
    fn new() -> Self {
        Self {
            in_flight: Mutex::new(0),
            flag: watch::channel(false).0,
        }
    }

    fn start(self: &Arc<Self>) -> ForecastLoadingGuard {
        let mut in_flight = match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *in_flight += 1;
        self.flag.send_replace(true);
        ForecastLoadingGuard {
            loading: Arc::clone(self),
        }
    }
}

/// Holds `forecast_loading` true for as long as it lives. Owned, so it can
/// be taken before a load is spawned and moved into the task.
#[derive(Debug)]
struct ForecastLoadingGuard {
    loading: Arc<ForecastLoading>,
}

impl Drop for ForecastLoadingGuard {
    fn drop(&mut self) {
        // Runs on success, failure and when the load future is dropped.
        let mut in_flight = match self.loading.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.loading.flag.send_replace(false);
        }
    }
}

impl WeatherSync {
    pub fn new(client: Arc<dyn WeatherClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_preferences(client, notifier, Preferences::default())
    }

    pub fn with_preferences(
        client: Arc<dyn WeatherClient>,
        notifier: Arc<dyn Notifier>,
        preferences: Preferences,
    ) -> Self {
        Self {
            client,
            notifier,
            generation: AtomicU64::new(0),
            forecast_loading: Arc::new(ForecastLoading::new()),
            weather: watch::channel(None).0,
            forecast: watch::channel(Vec::new()).0,
            air_quality: watch::channel(None).0,
            preferences: watch::channel(preferences).0,
            last_error: watch::channel(None).0,
        }
    }

    /// Start a new location selection. Loads started before this call
    /// discard their results when they complete.
    pub fn begin_selection(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_stale(&self, token: u64, what: &str) -> bool {
        let stale = self.generation() != token;
        if stale {
            debug!(token, current = self.generation(), "discarding stale {what} result");
        }
        stale
    }

    pub async fn load_weather(&self, coords: Coordinates, api_key: &str) {
        self.weather_at(self.generation(), coords, api_key).await
    }

    pub async fn load_weather_by_city(&self, city: &str, api_key: &str) {
        self.weather_by_city_at(self.generation(), city, api_key).await
    }

    pub async fn load_forecast(&self, city: &str, api_key: &str) {
        self.forecast_at(self.generation(), None, city, api_key).await
    }

    pub async fn load_forecast_by_coordinates(&self, coords: Coordinates, api_key: &str) {
        self.forecast_by_coordinates_at(self.generation(), None, coords, api_key)
            .await
    }

    pub async fn load_air_quality(&self, coords: Coordinates, api_key: &str) {
        self.air_quality_at(self.generation(), coords, api_key).await
    }

    async fn weather_at(&self, token: u64, coords: Coordinates, api_key: &str) {
        let result = self.client.fetch_current_by_coordinates(coords, api_key).await;
        self.publish_weather(token, result);
    }

    async fn weather_by_city_at(&self, token: u64, city: &str, api_key: &str) {
        let result = self.client.fetch_current_by_city(city, api_key).await;
        self.publish_weather(token, result);
    }

    async fn forecast_at(
        &self,
        token: u64,
        loading: Option<ForecastLoadingGuard>,
        city: &str,
        api_key: &str,
    ) {
        let _loading = loading.unwrap_or_else(|| self.forecast_loading.start());
        let result = self.client.fetch_forecast_by_city(city, api_key).await;
        self.publish_forecast(token, result);
    }

    async fn forecast_by_coordinates_at(
        &self,
        token: u64,
        loading: Option<ForecastLoadingGuard>,
        coords: Coordinates,
        api_key: &str,
    ) {
        let _loading = loading.unwrap_or_else(|| self.forecast_loading.start());
        let result = self.client.fetch_forecast_by_coordinates(coords, api_key).await;
        self.publish_forecast(token, result);
    }

    async fn air_quality_at(&self, token: u64, coords: Coordinates, api_key: &str) {
        let result = self.client.fetch_air_quality(coords, api_key).await;
        if self.is_stale(token, "air quality") {
            return;
        }

        match result {
            Ok(samples) => {
                self.air_quality.send_replace(samples.into_iter().next());
                self.clear_error(LoadSource::AirQuality);
            }
            Err(e) => {
                warn!("air quality load failed: {e}");
                self.air_quality.send_replace(None);
                self.record_error(LoadSource::AirQuality, FailureKind::from(&e));
            }
        }
    }

    pub async fn run(&self, request: LoadRequest, api_key: &str) {
        let token = self.generation();
        self.run_at(token, request, None, api_key).await
    }

    /// Launch one load as its own task. There is no cancellation; the task
    /// runs to completion or failure. The generation token and the forecast
    /// flag are taken here, before the task is first polled.
    pub fn spawn(self: &Arc<Self>, request: LoadRequest, api_key: String) -> JoinHandle<()> {
        let token = self.generation();
        let loading = request
            .loads_forecast()
            .then(|| self.forecast_loading.start());
        let sync = Arc::clone(self);
        tokio::spawn(async move { sync.run_at(token, request, loading, &api_key).await })
    }

    async fn run_at(
        &self,
        token: u64,
        request: LoadRequest,
        loading: Option<ForecastLoadingGuard>,
        api_key: &str,
    ) {
        match request {
            LoadRequest::Weather(coords) => self.weather_at(token, coords, api_key).await,
            LoadRequest::WeatherByCity(city) => {
                self.weather_by_city_at(token, &city, api_key).await
            }
            LoadRequest::Forecast(city) => self.forecast_at(token, loading, &city, api_key).await,
            LoadRequest::ForecastByCoordinates(coords) => {
                self.forecast_by_coordinates_at(token, loading, coords, api_key)
                    .await
            }
            LoadRequest::AirQuality(coords) => self.air_quality_at(token, coords, api_key).await,
        }
    }

    /// New selection by coordinates: current, forecast and air quality together.
    pub async fn refresh_for_coordinates(&self, coords: Coordinates, api_key: &str) {
        let token = self.begin_selection();
        tokio::join!(
            self.weather_at(token, coords, api_key),
            self.forecast_by_coordinates_at(token, None, coords, api_key),
            self.air_quality_at(token, coords, api_key),
        );
    }

    /// New selection by city name. Air quality needs coordinates, so it
    /// waits on geocoding while the other two loads run. All three loads
    /// carry the token taken here, including the one started after geocoding.
    pub async fn refresh_for_city(&self, city: &str, api_key: &str, resolver: &LocationResolver) {
        let token = self.begin_selection();
        tokio::join!(
            self.weather_by_city_at(token, city, api_key),
            self.forecast_at(token, None, city, api_key),
            async {
                match resolver.resolve_coordinates_from_city_name(city).await {
                    Some(coords) => self.air_quality_at(token, coords, api_key).await,
                    None if !self.is_stale(token, "air quality") => {
                        self.air_quality.send_replace(None);
                        self.record_error(LoadSource::AirQuality, FailureKind::Resolution);
                    }
                    None => {}
                }
            },
        );
    }

    pub fn set_notifications_enabled(&self, enabled: bool) {
        self.preferences
            .send_modify(|prefs| prefs.notifications_enabled = enabled);
    }

    pub fn set_use_fahrenheit(&self, use_fahrenheit: bool) {
        self.preferences
            .send_modify(|prefs| prefs.use_fahrenheit = use_fahrenheit);
    }

    pub fn preferences(&self) -> Preferences {
        *self.preferences.borrow()
    }

    pub fn snapshot(&self) -> SyncState {
        SyncState {
            weather: self.weather.borrow().clone(),
            forecast: self.forecast.borrow().clone(),
            air_quality: *self.air_quality.borrow(),
            forecast_loading: *self.forecast_loading.flag.borrow(),
            preferences: *self.preferences.borrow(),
            last_error: *self.last_error.borrow(),
        }
    }

    pub fn subscribe_weather(&self) -> watch::Receiver<Option<CurrentWeather>> {
        self.weather.subscribe()
    }

    pub fn subscribe_forecast(&self) -> watch::Receiver<Vec<ForecastPoint>> {
        self.forecast.subscribe()
    }

    pub fn subscribe_air_quality(&self) -> watch::Receiver<Option<AirQualitySample>> {
        self.air_quality.subscribe()
    }

    pub fn subscribe_forecast_loading(&self) -> watch::Receiver<bool> {
        self.forecast_loading.flag.subscribe()
    }

    pub fn subscribe_preferences(&self) -> watch::Receiver<Preferences> {
        self.preferences.subscribe()
    }

    pub fn subscribe_last_error(&self) -> watch::Receiver<Option<LoadFailure>> {
        self.last_error.subscribe()
    }

    fn publish_weather(&self, token: u64, result: Result<CurrentWeather, RemoteError>) {
        if self.is_stale(token, "weather") {
            return;
        }

        match result {
            Ok(weather) => {
                debug!(location = %weather.location_name, "weather updated");
                self.weather.send_replace(Some(weather.clone()));
                self.clear_error(LoadSource::Weather);

                alerts::evaluate_and_notify(
                    Some(&weather),
                    self.preferences().notifications_enabled,
                    self.notifier.as_ref(),
                );
            }
            Err(e) => {
                warn!("weather load failed: {e}");
                self.weather.send_replace(None);
                self.record_error(LoadSource::Weather, FailureKind::from(&e));
            }
        }
    }

    fn publish_forecast(&self, token: u64, result: Result<Vec<ForecastPoint>, RemoteError>) {
        if self.is_stale(token, "forecast") {
            return;
        }

        match result {
            Ok(points) => {
                debug!(points = points.len(), "forecast updated");
                self.forecast.send_replace(points);
                self.clear_error(LoadSource::Forecast);
            }
            Err(e) => {
                warn!("forecast load failed: {e}");
                self.forecast.send_replace(Vec::new());
                self.record_error(LoadSource::Forecast, FailureKind::from(&e));
            }
        }
    }

    fn record_error(&self, source: LoadSource, kind: FailureKind) {
        self.last_error.send_replace(Some(LoadFailure { source, kind }));
    }

    fn clear_error(&self, source: LoadSource) {
        self.last_error.send_if_modified(|last| match last {
            Some(failure) if failure.source == source => {
                *last = None;
                true
            }
            _ => false,
        });
    }
}
