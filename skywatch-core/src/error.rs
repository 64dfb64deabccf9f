//! Error types shared across the core.

use thiserror::Error;

/// Any failure talking to the weather provider.
///
/// A "city not found" answer from the provider is reported as
/// [`RemoteError::Status`] like every other non-success response.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to parse {endpoint} JSON: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl RemoteError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Location or geocoding was unavailable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    #[error("location provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("geocoding failed: {0}")]
    Geocoding(String),
}

/// Rejected free-text city input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CityNameError {
    #[error("Please enter a city name.")]
    Blank,

    #[error("Invalid city name format.")]
    InvalidFormat,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("lifecycle already stopped")]
    Stopped,
}
