//! QWeather ("hefeng") adapter.
//!
//! QWeather identifies places by id, so every fetch starts with a city
//! lookup. Its status field `code` is a JSON string: `"200"` is success.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    error::ProviderError,
    model::{DailySummary, InstantReading, Range, Reading, WeatherRecord},
    provider::{Endpoints, ProviderId, join, lenient, location::resolve_location, raw_status},
    transport::Transport,
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct HefengProvider {
    api_key: String,
    geo_base: String,
    weather_base: String,
    transport: Arc<dyn Transport>,
}

impl HefengProvider {
    pub fn new(api_key: String, endpoints: &Endpoints, transport: Arc<dyn Transport>) -> Self {
        Self {
            api_key,
            geo_base: endpoints.hefeng_geo.clone(),
            weather_base: endpoints.hefeng_weather.clone(),
            transport,
        }
    }

    fn endpoint(&self, range: Range) -> String {
        let segment = match range {
            Range::Today => "now",
            Range::NextWeek => "7d",
            Range::Next15Days => "15d",
        };
        join(&self.weather_base, segment)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HfNow {
    #[serde(deserialize_with = "lenient::number")]
    temp: f64,
    #[serde(deserialize_with = "lenient::number")]
    feels_like: f64,
    text: String,
    #[serde(deserialize_with = "lenient::number")]
    humidity: u8,
    #[serde(deserialize_with = "lenient::number")]
    wind_speed: f64,
    wind_dir: String,
    #[serde(deserialize_with = "lenient::number")]
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct HfNowResponse {
    now: HfNow,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HfDaily {
    fx_date: NaiveDate,
    #[serde(deserialize_with = "lenient::number")]
    temp_max: f64,
    #[serde(deserialize_with = "lenient::number")]
    temp_min: f64,
    text_day: String,
    text_night: String,
    #[serde(deserialize_with = "lenient::number")]
    humidity: u8,
    #[serde(deserialize_with = "lenient::number")]
    wind_speed_day: f64,
    wind_dir_day: String,
    #[serde(deserialize_with = "lenient::number")]
    wind_speed_night: f64,
    wind_dir_night: String,
    #[serde(deserialize_with = "lenient::number")]
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct HfDailyResponse {
    daily: Vec<HfDaily>,
}

impl From<HfNow> for InstantReading {
    fn from(now: HfNow) -> Self {
        InstantReading {
            temperature: now.temp,
            feels_like: now.feels_like,
            condition: now.text,
            humidity: now.humidity,
            wind_speed: now.wind_speed,
            wind_direction: now.wind_dir,
            pressure: now.pressure,
        }
    }
}

impl From<HfDaily> for DailySummary {
    fn from(day: HfDaily) -> Self {
        DailySummary {
            temp_max: day.temp_max,
            temp_min: day.temp_min,
            condition_day: day.text_day,
            condition_night: day.text_night,
            humidity: day.humidity,
            wind_speed_day: day.wind_speed_day,
            wind_direction_day: day.wind_dir_day,
            wind_speed_night: day.wind_speed_night,
            wind_direction_night: day.wind_dir_night,
            pressure: day.pressure,
        }
    }
}

fn parse_records(body: Value, city: &str, range: Range) -> Result<Vec<WeatherRecord>, ProviderError> {
    match range {
        Range::Today => {
            let parsed: HfNowResponse = serde_json::from_value(body)?;
            Ok(vec![WeatherRecord::new(
                city,
                ProviderId::Hefeng,
                range,
                Reading::Instant(parsed.now.into()),
            )])
        }
        Range::NextWeek | Range::Next15Days => {
            let parsed: HfDailyResponse = serde_json::from_value(body)?;
            Ok(parsed
                .daily
                .into_iter()
                .map(|day| {
                    let date = day.fx_date;
                    WeatherRecord::new(city, ProviderId::Hefeng, range, Reading::Daily(day.into()))
                        .on(date)
                })
                .collect())
        }
    }
}

#[async_trait]
impl WeatherProvider for HefengProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Hefeng
    }

    async fn try_fetch(
        &self,
        city: &str,
        range: Range,
    ) -> Result<Vec<WeatherRecord>, ProviderError> {
        let location =
            resolve_location(self.transport.as_ref(), &self.geo_base, city, &self.api_key)
                .await
                .ok_or_else(|| ProviderError::LocationNotFound(city.to_string()))?;

        let body = self
            .transport
            .get_json(
                &self.endpoint(range),
                &[("location", location.as_str()), ("key", self.api_key.as_str())],
            )
            .await?;

        // QWeather status codes are strings; a numeric 200 is not success.
        match body.get("code").and_then(Value::as_str) {
            Some("200") => parse_records(body, city, range),
            Some("401") => Err(ProviderError::InvalidKey),
            Some("404") => Err(ProviderError::CityNotFound),
            _ => Err(ProviderError::Upstream(raw_status(&body, "code"))),
        }
    }
}
