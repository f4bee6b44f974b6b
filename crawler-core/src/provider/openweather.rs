//! OpenWeatherMap adapter.
//!
//! Takes the city name directly. Success is a *numeric* `cod` of `200`,
//! while errors arrive as *strings* (`"401"`, `"404"`); both rules are kept
//! as the upstream API defines them.

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    error::ProviderError,
    model::{InstantReading, Range, Reading, WeatherRecord},
    provider::{Endpoints, ProviderId, join, lenient, raw_status},
    transport::Transport,
};

use super::WeatherProvider;

/// Forecast slots further out than this many days are dropped.
const WEEK_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base: String,
    transport: Arc<dyn Transport>,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, endpoints: &Endpoints, transport: Arc<dyn Transport>) -> Self {
        Self {
            api_key,
            base: endpoints.openweather.clone(),
            transport,
        }
    }

    fn endpoint(&self, range: Range) -> Option<String> {
        match range {
            Range::Today => Some(join(&self.base, "weather")),
            Range::NextWeek => Some(join(&self.base, "forecast")),
            Range::Next15Days => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    #[serde(deserialize_with = "lenient::number")]
    humidity: u8,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    #[serde(default, deserialize_with = "lenient::text")]
    deg: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

fn instant(main: OwMain, weather: Vec<OwWeather>, wind: OwWind) -> InstantReading {
    let condition = weather
        .into_iter()
        .next()
        .map(|w| w.main)
        .unwrap_or_else(|| "Unknown".to_string());

    InstantReading {
        temperature: main.temp,
        feels_like: main.feels_like,
        condition,
        humidity: main.humidity,
        wind_speed: wind.speed,
        wind_direction: wind.deg,
        pressure: main.pressure,
    }
}

/// Keep slots whose local date is at most [`WEEK_DAYS`] after `today`,
/// one record per slot, in provider order.
fn week_slots(entries: Vec<OwForecastEntry>, city: &str, today: NaiveDate) -> Vec<WeatherRecord> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let at: DateTime<Local> = Local.timestamp_opt(entry.dt, 0).single()?;
            let date = at.date_naive();
            if (date - today).num_days() > WEEK_DAYS {
                return None;
            }

            let reading = instant(entry.main, entry.weather, entry.wind);
            Some(
                WeatherRecord::new(city, ProviderId::OpenWeather, Range::NextWeek, Reading::Instant(reading))
                    .on(date)
                    .at(at.time()),
            )
        })
        .collect()
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn try_fetch(
        &self,
        city: &str,
        range: Range,
    ) -> Result<Vec<WeatherRecord>, ProviderError> {
        let url = self.endpoint(range).ok_or(ProviderError::UnsupportedRange(range))?;

        let body = self
            .transport
            .get_json(
                &url,
                &[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")],
            )
            .await?;

        let cod = body.get("cod");
        if cod.and_then(Value::as_i64) == Some(200) {
            return match range {
                Range::Today => {
                    let parsed: OwCurrentResponse = serde_json::from_value(body)?;
                    let reading = instant(parsed.main, parsed.weather, parsed.wind);
                    Ok(vec![WeatherRecord::new(
                        city,
                        ProviderId::OpenWeather,
                        range,
                        Reading::Instant(reading),
                    )])
                }
                _ => {
                    let parsed: OwForecastResponse = serde_json::from_value(body)?;
                    Ok(week_slots(parsed.list, city, Local::now().date_naive()))
                }
            };
        }

        match cod.and_then(Value::as_str) {
            Some("401") => Err(ProviderError::InvalidKey),
            Some("404") => Err(ProviderError::CityNotFound),
            _ => Err(ProviderError::Upstream(raw_status(&body, "cod"))),
        }
    }
}
