//! Location resolution: device fixes and free-text city names.
//!
//! Both capabilities are best effort. Provider failures degrade to `None`
//! and are logged, never returned.

use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};
use tracing::{debug, warn};

use crate::{
    error::{CityNameError, ResolutionFailure},
    model::Coordinates,
};

/// Fixes coarser than this are not trusted over the last-known fix.
pub const MAX_FRESH_ACCURACY_M: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub coordinates: Coordinates,
    pub accuracy_m: f64,
}

/// Host location service.
#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    /// Request a fresh high-accuracy fix.
    async fn current_fix(&self) -> Result<Option<Fix>, ResolutionFailure>;

    async fn last_known_fix(&self) -> Result<Option<Fix>, ResolutionFailure>;
}

/// Host geocoding service: name to candidate coordinates, best match first.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn locate(&self, name: &str) -> Result<Vec<Coordinates>, ResolutionFailure>;
}

#[derive(Debug, Clone)]
pub struct LocationResolver {
    provider: Arc<dyn LocationProvider>,
    geocoder: Arc<dyn Geocoder>,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn LocationProvider>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { provider, geocoder }
    }

    pub async fn resolve_current_device_location(&self) -> Option<Coordinates> {
        match self.provider.current_fix().await {
            Ok(Some(fix)) if fix.accuracy_m <= MAX_FRESH_ACCURACY_M => {
                debug!(
                    coordinates = %fix.coordinates,
                    accuracy_m = fix.accuracy_m,
                    "using fresh location fix"
                );
                return Some(fix.coordinates);
            }
            Ok(Some(fix)) => {
                debug!(accuracy_m = fix.accuracy_m, "fresh fix too coarse, falling back");
            }
            Ok(None) => debug!("no fresh fix, falling back"),
            Err(e) => {
                warn!("current location request failed: {e}");
                return None;
            }
        }

        match self.provider.last_known_fix().await {
            Ok(Some(fix)) => {
                debug!(
                    coordinates = %fix.coordinates,
                    accuracy_m = fix.accuracy_m,
                    "using last-known location fix"
                );
                Some(fix.coordinates)
            }
            Ok(None) => {
                debug!("no location available");
                None
            }
            Err(e) => {
                warn!("last-known location request failed: {e}");
                None
            }
        }
    }

    /// First geocoder match wins; there is no disambiguation.
    pub async fn resolve_coordinates_from_city_name(&self, name: &str) -> Option<Coordinates> {
        match self.geocoder.locate(name).await {
            Ok(results) => {
                let first = results.into_iter().next();
                if first.is_none() {
                    warn!(city = name, "no geocoding results");
                }
                first
            }
            Err(e) => {
                warn!(city = name, "geocoding failed: {e}");
                None
            }
        }
    }
}

/// A fixed fix standing in for a GPS receiver, e.g. a configured home location.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    fix: Option<Fix>,
}

impl FixedLocationProvider {
    pub fn new(fix: Option<Fix>) -> Self {
        Self { fix }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_fix(&self) -> Result<Option<Fix>, ResolutionFailure> {
        Ok(self.fix)
    }

    async fn last_known_fix(&self) -> Result<Option<Fix>, ResolutionFailure> {
        Ok(self.fix)
    }
}

/// Trim and check free-text city input: at least two ASCII letters,
/// spaces or hyphens.
pub fn validate_city_name(input: &str) -> Result<&str, CityNameError> {
    let cleaned = input.trim();
    if cleaned.is_empty() {
        return Err(CityNameError::Blank);
    }

    let well_formed = cleaned.chars().count() >= 2
        && cleaned
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || c == '-');

    if well_formed {
        Ok(cleaned)
    } else {
        Err(CityNameError::InvalidFormat)
    }
}
