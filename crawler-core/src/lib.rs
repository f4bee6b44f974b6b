//! Core library for the `weather-crawler` CLI.
//!
//! This crate defines:
//! - Settings & credentials handling
//! - The QWeather and OpenWeatherMap adapters and the city lookup
//! - The unified record model every provider response is mapped into
//! - The aggregator that merges providers and ranges into one result set
//! - JSON file and SQLite sinks
//!
//! It is used by `crawler-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod sink;
pub mod transport;

pub use aggregate::{Aggregation, Aggregator, Failure};
pub use config::{ProviderConfig, Settings};
pub use error::{FailureKind, ProviderError, TransportError};
pub use model::{
    DailySummary, InstantReading, LocationId, Mode, Range, RangeSpec, Reading, WeatherRecord,
};
pub use provider::{Endpoints, ProviderId, WeatherProvider};
pub use transport::{HttpTransport, Transport};
