use crate::{
    Settings,
    error::{FailureKind, ProviderError},
    model::{Range, WeatherRecord},
    provider::{hefeng::HefengProvider, openweather::OpenWeatherProvider},
    transport::Transport,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod hefeng;
mod lenient;
pub mod location;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Hefeng,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Hefeng => "hefeng",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Hefeng, ProviderId::OpenWeather]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::Hefeng => "QWeather",
            ProviderId::OpenWeather => "OpenWeatherMap",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "hefeng" | "qweather" => Ok(ProviderId::Hefeng),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: hefeng, openweather."
            )),
        }
    }
}

/// Base URLs of every upstream API. Overridable from the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub hefeng_geo: String,
    pub hefeng_weather: String,
    pub openweather: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            hefeng_geo: "https://geoapi.qweather.com/v2".to_string(),
            hefeng_weather: "https://devapi.qweather.com/v7/weather".to_string(),
            openweather: "https://api.openweathermap.org/data/2.5".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every provider at one host; used against local mock servers.
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            hefeng_geo: format!("{base}/geo/v2"),
            hefeng_weather: format!("{base}/v7/weather"),
            openweather: format!("{base}/data/2.5"),
        }
    }
}

pub(crate) fn join(base: &str, segment: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), segment)
}

/// Status field rendered verbatim for diagnostics.
pub(crate) fn raw_status(body: &Value, field: &str) -> String {
    match body.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "<missing>".to_string(),
    }
}

/// One upstream weather API mapped onto [`WeatherRecord`]s.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Fetch one range, reporting why nothing came back.
    async fn try_fetch(
        &self,
        city: &str,
        range: Range,
    ) -> Result<Vec<WeatherRecord>, ProviderError>;

    /// Fetch one range; every failure is logged and degrades to no records.
    async fn fetch(&self, city: &str, range: Range) -> Vec<WeatherRecord> {
        match self.try_fetch(city, range).await {
            Ok(records) => records,
            Err(err) => {
                log_failure(self.id(), Some(range), err.kind(), &err);
                Vec::new()
            }
        }
    }
}

pub(crate) fn log_failure(
    provider: ProviderId,
    range: Option<Range>,
    kind: FailureKind,
    err: &dyn std::fmt::Display,
) {
    let range = range.map(|r| r.as_str()).unwrap_or("-");
    match kind {
        FailureKind::UnsupportedRange => {
            tracing::info!(%provider, range, %kind, "{} skipped: {err}", provider.display_name())
        }
        _ => tracing::warn!(%provider, range, %kind, "{}: {err}", provider.display_name()),
    }
}

/// Construct a provider from settings and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    settings: &Settings,
    transport: Arc<dyn Transport>,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = settings.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weather-crawler configure` and enter your API key."
        )
    })?;

    let endpoints = &settings.endpoints;
    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::Hefeng => Box::new(HefengProvider::new(
            api_key.to_owned(),
            endpoints,
            transport,
        )),
        ProviderId::OpenWeather => Box::new(OpenWeatherProvider::new(
            api_key.to_owned(),
            endpoints,
            transport,
        )),
    };

    Ok(boxed)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::{error::TransportError, transport::Transport};

    /// Serves canned bodies keyed by URL suffix and records every request.
    #[derive(Debug, Default)]
    pub struct StubTransport {
        routes: Vec<(String, Value)>,
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl StubTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(mut self, suffix: &str, body: Value) -> Self {
            self.routes.push((suffix.to_string(), body));
            self
        }

        pub fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn get_json(
            &self,
            url: &str,
            query: &[(&str, &str)],
        ) -> Result<Value, TransportError> {
            self.calls.lock().unwrap().push((
                url.to_string(),
                query.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ));

            self.routes
                .iter()
                .find(|(suffix, _)| url.ends_with(suffix.as_str()))
                .map(|(_, body)| body.clone())
                .ok_or_else(|| TransportError::Status {
                    url: url.to_string(),
                    status: 500,
                    body: "no stub route".to_string(),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Settings, provider::testing::StubTransport};

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("weatherapi").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let settings = Settings::default();
        let err = provider_from_config(
            ProviderId::OpenWeather,
            &settings,
            Arc::new(StubTransport::new()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("No API key configured for provider"));
    }

    #[test]
    fn provider_from_config_builds_matching_provider() {
        let mut settings = Settings::default();
        settings.upsert_provider_api_key(ProviderId::Hefeng, "KEY".to_string());

        let provider =
            provider_from_config(ProviderId::Hefeng, &settings, Arc::new(StubTransport::new()))
                .expect("key is configured");
        assert_eq!(provider.id(), ProviderId::Hefeng);
    }

    #[test]
    fn rooted_endpoints_share_one_host() {
        let endpoints = Endpoints::rooted_at("http://127.0.0.1:9000/");
        assert_eq!(endpoints.hefeng_geo, "http://127.0.0.1:9000/geo/v2");
        assert_eq!(join(&endpoints.openweather, "weather"), "http://127.0.0.1:9000/data/2.5/weather");
    }

    #[test]
    fn raw_status_renders_numbers_and_strings() {
        let body = serde_json::json!({ "cod": 500, "code": "402" });
        assert_eq!(raw_status(&body, "cod"), "500");
        assert_eq!(raw_status(&body, "code"), "402");
        assert_eq!(raw_status(&body, "status"), "<missing>");
    }
}
