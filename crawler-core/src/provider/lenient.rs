//! Field decoders for APIs that are loose about JSON types.
//!
//! QWeather sends every number as a string (`"temp": "24"`), OpenWeather sends
//! wind direction as a number of degrees.

use serde::{Deserialize, Deserializer, de};
use std::{fmt::Display, str::FromStr};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

/// Accepts `24`, `24.5` or `"24"`.
pub(crate) fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match NumberOrText::<T>::deserialize(deserializer)? {
        NumberOrText::Number(value) => Ok(value),
        NumberOrText::Text(text) => text.trim().parse().map_err(de::Error::custom),
    }
}

/// Accepts `"NE"` or `270`, always yielding text.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::<serde_json::Number>::deserialize(deserializer)? {
        NumberOrText::Number(value) => Ok(value.to_string()),
        NumberOrText::Text(text) => Ok(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "number")]
        humidity: u8,
        #[serde(deserialize_with = "number")]
        temp: f64,
        #[serde(deserialize_with = "text")]
        dir: String,
    }

    #[test]
    fn accepts_numbers_encoded_as_strings() {
        let s: Sample =
            serde_json::from_value(json!({ "humidity": "65", "temp": "-3", "dir": "北风" }))
                .unwrap();
        assert_eq!(s.humidity, 65);
        assert_eq!(s.temp, -3.0);
        assert_eq!(s.dir, "北风");
    }

    #[test]
    fn accepts_plain_numbers() {
        let s: Sample =
            serde_json::from_value(json!({ "humidity": 40, "temp": 21.5, "dir": 270 })).unwrap();
        assert_eq!(s.humidity, 40);
        assert_eq!(s.temp, 21.5);
        assert_eq!(s.dir, "270");
    }

    #[test]
    fn rejects_non_numeric_text() {
        let err = serde_json::from_value::<Sample>(json!({
            "humidity": "humid", "temp": 1, "dir": "N"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("invalid digit"));
    }
}
