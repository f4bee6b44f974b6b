//! Failure taxonomy for the fetch pipeline.
//!
//! Nothing here aborts a run: adapters turn every failure into an empty
//! contribution, and the aggregator keeps a [`FailureKind`] per failed call
//! so callers can tell *why* a provider contributed nothing.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::model::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    TransportFailure,
    InvalidCredentials,
    CityNotFound,
    UnsupportedRange,
    UnknownProviderError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::TransportFailure => "transport_failure",
            FailureKind::InvalidCredentials => "invalid_credentials",
            FailureKind::CityNotFound => "city_not_found",
            FailureKind::UnsupportedRange => "unsupported_range",
            FailureKind::UnknownProviderError => "unknown_provider_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP-level failure. Logged where it happens; callers only see "no data".
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unexpected response shape: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("API key is invalid")]
    InvalidKey,

    #[error("no API key configured")]
    MissingKey,

    #[error("could not resolve a location id for '{0}'")]
    LocationNotFound(String),

    #[error("city not found")]
    CityNotFound,

    #[error("data range '{0}' is not supported by this provider")]
    UnsupportedRange(Range),

    #[error("provider returned status {0}")]
    Upstream(String),
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) | Self::Payload(_) => FailureKind::TransportFailure,
            Self::InvalidKey | Self::MissingKey => FailureKind::InvalidCredentials,
            Self::LocationNotFound(_) | Self::CityNotFound => FailureKind::CityNotFound,
            Self::UnsupportedRange(_) => FailureKind::UnsupportedRange,
            Self::Upstream(_) => FailureKind::UnknownProviderError,
        }
    }
}
