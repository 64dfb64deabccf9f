//! City-name geocoding via the OpenWeather direct geocoding endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    client::openweather::{DEFAULT_BASE_URL, truncate_body},
    error::ResolutionFailure,
    location::Geocoder,
    model::Coordinates,
};

const DIRECT_PATH: &str = "/geo/1.0/direct";

#[derive(Debug, Deserialize)]
struct GeoEntry {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherGeocoder {
    http: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherGeocoder {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl Geocoder for OpenWeatherGeocoder {
    async fn locate(&self, name: &str) -> Result<Vec<Coordinates>, ResolutionFailure> {
        let url = format!("{}{}", self.base_url, DIRECT_PATH);

        let response = self
            .http
            .get(&url)
            .query(&[("q", name), ("limit", "1"), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ResolutionFailure::Geocoding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResolutionFailure::Geocoding(format!(
                "status {}: {}",
                status,
                truncate_body(&body)
            )));
        }

        let entries: Vec<GeoEntry> = response
            .json()
            .await
            .map_err(|e| ResolutionFailure::Geocoding(e.to_string()))?;

        debug!(city = name, matches = entries.len(), "geocoded city name");
        Ok(entries
            .into_iter()
            .map(|e| Coordinates::new(e.lat, e.lon))
            .collect())
    }
}
