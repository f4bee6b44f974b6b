use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::{fmt::Debug, time::Duration};

use crate::error::TransportError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// "GET this URL with these query parameters and give me the JSON body".
///
/// Implementations log failure details themselves; callers treat any `Err`
/// as "no data from this call".
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("weather-crawler/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http })
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    async fn request(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, TransportError> {
        // Query strings carry API keys, so errors are stripped of their URL.
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| TransportError::Network {
                url: url.to_string(),
                source: source.without_url(),
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| TransportError::Network {
            url: url.to_string(),
            source: source.without_url(),
        })?;

        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| TransportError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, TransportError> {
        tracing::debug!(%url, "GET");
        let result = self.request(url, query).await;
        if let Err(err) = &result {
            tracing::warn!(%url, "{err}");
        }
        result
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let head: String = body.chars().take(MAX).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}
