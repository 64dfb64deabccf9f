use crate::{
    Config,
    client::openweather::OpenWeatherClient,
    error::RemoteError,
    model::{AirQualitySample, Coordinates, CurrentWeather, ForecastPoint},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Request/response mapping onto the weather provider.
///
/// Every call is one round trip with no retries and no caching. Callers
/// pick the subset they need for a given location.
#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    async fn fetch_current_by_coordinates(
        &self,
        coords: Coordinates,
        api_key: &str,
    ) -> Result<CurrentWeather, RemoteError>;

    async fn fetch_current_by_city(
        &self,
        city: &str,
        api_key: &str,
    ) -> Result<CurrentWeather, RemoteError>;

    async fn fetch_forecast_by_coordinates(
        &self,
        coords: Coordinates,
        api_key: &str,
    ) -> Result<Vec<ForecastPoint>, RemoteError>;

    async fn fetch_forecast_by_city(
        &self,
        city: &str,
        api_key: &str,
    ) -> Result<Vec<ForecastPoint>, RemoteError>;

    /// An empty list is a valid answer meaning "no data".
    async fn fetch_air_quality(
        &self,
        coords: Coordinates,
        api_key: &str,
    ) -> Result<Vec<AirQualitySample>, RemoteError>;
}

/// Construct the OpenWeather client, honouring a configured base URL.
pub fn client_from_config(config: &Config) -> Arc<dyn WeatherClient> {
    match config.base_url.as_deref() {
        Some(base) => Arc::new(OpenWeatherClient::with_base_url(base)),
        None => Arc::new(OpenWeatherClient::new()),
    }
}
