//! City name → QWeather location id.

use serde::Deserialize;

use crate::{
    error::FailureKind,
    model::LocationId,
    provider::{join, raw_status},
    transport::Transport,
};

#[derive(Debug, Deserialize)]
struct LookupEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    location: Vec<LookupEntry>,
}

/// Look up the QWeather id of `city`.
///
/// Success means `code == "200"` and at least one match; the first match
/// wins. Anything else, including transport failures, returns `None`.
pub async fn resolve_location(
    transport: &dyn Transport,
    geo_base: &str,
    city: &str,
    api_key: &str,
) -> Option<LocationId> {
    let url = join(geo_base, "city/lookup");
    let body = transport
        .get_json(&url, &[("location", city), ("key", api_key)])
        .await
        .ok()?;

    if body.get("code").and_then(|c| c.as_str()) != Some("200") {
        tracing::warn!(
            provider = "hefeng",
            kind = %FailureKind::CityNotFound,
            city,
            code = %raw_status(&body, "code"),
            "QWeather city lookup failed"
        );
        return None;
    }

    let parsed: LookupResponse = match serde_json::from_value(body) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(provider = "hefeng", city, "QWeather city lookup returned {err}");
            return None;
        }
    };

    match parsed.location.into_iter().next() {
        Some(entry) => {
            tracing::debug!(city, id = %entry.id, "resolved QWeather location");
            Some(LocationId::new(entry.id))
        }
        None => {
            tracing::warn!(
                provider = "hefeng",
                kind = %FailureKind::CityNotFound,
                city,
                "QWeather city lookup returned no matches"
            );
            None
        }
    }
}
