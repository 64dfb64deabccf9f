//! Core library for the `skywatch` weather app.
//!
//! This crate defines:
//! - The OpenWeather client (current conditions, hourly forecast, air quality)
//! - Location resolution from a device fix or a city name
//! - The observable synchronization state fed by independent loads
//! - Threshold alerts, unit conversion and lifecycle-bound resources
//! - Configuration & credentials handling
//!
//! It is used by `skywatch-cli`, but any host that can implement the
//! location, geocoding and notification traits can drive it.

pub mod alerts;
pub mod client;
pub mod config;
pub mod error;
pub mod geocode;
pub mod lifecycle;
pub mod location;
pub mod model;
pub mod state;
pub mod units;

pub use alerts::{Alert, AlertCategory, Notifier};
pub use client::{WeatherClient, client_from_config, openweather::OpenWeatherClient};
pub use config::{Config, HomeLocation};
pub use error::{CityNameError, LifecycleError, RemoteError, ResolutionFailure};
pub use geocode::OpenWeatherGeocoder;
pub use lifecycle::{AmbientResource, Lifecycle, LifecycleState, PermissionGate, Permissions};
pub use location::{FixedLocationProvider, Geocoder, LocationProvider, LocationResolver};
pub use model::{AirQualitySample, Coordinates, CurrentWeather, ForecastPoint, Preferences};
pub use state::{LoadRequest, SyncState, WeatherSync};
