//! Drives the provider adapters and concatenates their records.
//!
//! Calls are made one after another: ranges in the mode's declared order,
//! and within a range QWeather before OpenWeather. Nothing here fails; each
//! failed call leaves a [`Failure`] behind and contributes no records.

use serde::Serialize;
use std::sync::Arc;

use crate::{
    Settings,
    error::{FailureKind, ProviderError},
    model::{Mode, Range, RangeSpec, WeatherRecord},
    provider::{ProviderId, WeatherProvider, log_failure, provider_from_config},
    transport::{HttpTransport, Transport},
};

/// Why one (provider, range) call produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub provider: Option<ProviderId>,
    pub range: Option<Range>,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Aggregation {
    pub records: Vec<WeatherRecord>,
    pub failures: Vec<Failure>,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &Failure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }
}

#[derive(Debug, Default)]
pub struct Aggregator {
    hefeng: Option<Box<dyn WeatherProvider>>,
    openweather: Option<Box<dyn WeatherProvider>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider in the slot matching its id, replacing any previous one.
    pub fn with_provider(mut self, provider: Box<dyn WeatherProvider>) -> Self {
        match provider.id() {
            ProviderId::Hefeng => self.hefeng = Some(provider),
            ProviderId::OpenWeather => self.openweather = Some(provider),
        }
        self
    }

    /// Build every provider that has an API key, sharing one HTTP client.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new()?);
        Ok(Self::from_settings_with(settings, transport))
    }

    pub fn from_settings_with(settings: &Settings, transport: Arc<dyn Transport>) -> Self {
        ProviderId::all()
            .iter()
            .filter(|id| settings.is_provider_configured(**id))
            .filter_map(|id| provider_from_config(*id, settings, transport.clone()).ok())
            .fold(Self::new(), Self::with_provider)
    }

    fn provider(&self, id: ProviderId) -> Option<&dyn WeatherProvider> {
        match id {
            ProviderId::Hefeng => self.hefeng.as_deref(),
            ProviderId::OpenWeather => self.openweather.as_deref(),
        }
    }

    pub async fn aggregate(&self, city: &str, mode: Mode, spec: RangeSpec) -> Aggregation {
        let ranges: &[Range] = match spec {
            RangeSpec::All => mode.supported_ranges(),
            RangeSpec::Only(ref range) => std::slice::from_ref(range),
        };

        tracing::info!(city, %mode, range = %spec, "fetching weather");

        let mut out = Aggregation::default();
        for &range in ranges {
            for &id in mode.providers() {
                self.collect(&mut out, id, city, range).await;
            }
        }

        tracing::info!(
            records = out.records.len(),
            failures = out.failures.len(),
            "fetch finished"
        );
        out
    }

    /// Same as [`Aggregator::aggregate`], parsing the range token first.
    /// An unknown token is an `UnsupportedRange` failure, not an error.
    pub async fn aggregate_token(&self, city: &str, mode: Mode, token: &str) -> Aggregation {
        match RangeSpec::try_from(token) {
            Ok(spec) => self.aggregate(city, mode, spec).await,
            Err(err) => {
                tracing::warn!(kind = %FailureKind::UnsupportedRange, token, "{err}");
                Aggregation {
                    records: Vec::new(),
                    failures: vec![Failure {
                        provider: None,
                        range: None,
                        kind: FailureKind::UnsupportedRange,
                        message: err.to_string(),
                    }],
                }
            }
        }
    }

    async fn collect(&self, out: &mut Aggregation, id: ProviderId, city: &str, range: Range) {
        let result = match self.provider(id) {
            Some(provider) => provider.try_fetch(city, range).await,
            None => Err(ProviderError::MissingKey),
        };

        match result {
            Ok(records) => {
                tracing::debug!(provider = %id, %range, count = records.len(), "records received");
                out.records.extend(records);
            }
            Err(err) => {
                let kind = err.kind();
                log_failure(id, Some(range), kind, &err);
                out.failures.push(Failure {
                    provider: Some(id),
                    range: Some(range),
                    kind,
                    message: err.to_string(),
                });
            }
        }
    }
}
