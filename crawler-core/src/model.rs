use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

use crate::provider::ProviderId;

/// Forecast horizon bucket a caller asks for.
///
/// This is the *requested* bucket, not the provider's native granularity:
/// OpenWeather answers `next_week` with 3-hour slots, QWeather with days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Range {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "next_week")]
    NextWeek,
    #[serde(rename = "next_15_days")]
    Next15Days,
}

impl Range {
    pub fn as_str(&self) -> &'static str {
        match self {
            Range::Today => "today",
            Range::NextWeek => "next_week",
            Range::Next15Days => "next_15_days",
        }
    }

    pub const fn all() -> &'static [Range] {
        &[Range::Today, Range::NextWeek, Range::Next15Days]
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Range {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "today" => Ok(Range::Today),
            "next_week" => Ok(Range::NextWeek),
            "next_15_days" => Ok(Range::Next15Days),
            _ => Err(anyhow::anyhow!(
                "Unknown data range '{value}'. Supported ranges: today, next_week, next_15_days."
            )),
        }
    }
}

/// Either a single range or every range the selected mode supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    All,
    Only(Range),
}

impl RangeSpec {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeSpec::All => "all",
            RangeSpec::Only(range) => range.as_str(),
        }
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Range> for RangeSpec {
    fn from(range: Range) -> Self {
        RangeSpec::Only(range)
    }
}

impl TryFrom<&str> for RangeSpec {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(RangeSpec::All);
        }
        Range::try_from(value).map(RangeSpec::Only)
    }
}

/// Which provider(s) a run queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Hefeng,
    OpenWeather,
    #[default]
    Both,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Hefeng => "hefeng",
            Mode::OpenWeather => "openweather",
            Mode::Both => "both",
        }
    }

    pub const fn all() -> &'static [Mode] {
        &[Mode::Hefeng, Mode::OpenWeather, Mode::Both]
    }

    /// Providers queried for each range, in call order.
    pub const fn providers(&self) -> &'static [ProviderId] {
        match self {
            Mode::Hefeng => &[ProviderId::Hefeng],
            Mode::OpenWeather => &[ProviderId::OpenWeather],
            Mode::Both => &[ProviderId::Hefeng, ProviderId::OpenWeather],
        }
    }

    /// Ranges iterated, in order, when the caller asks for `all`.
    ///
    /// `Both` advertises the union; OpenWeather simply contributes nothing
    /// for `next_15_days`.
    pub const fn supported_ranges(&self) -> &'static [Range] {
        match self {
            Mode::Hefeng | Mode::Both => &[Range::Today, Range::NextWeek, Range::Next15Days],
            Mode::OpenWeather => &[Range::Today, Range::NextWeek],
        }
    }

    pub fn supports(&self, spec: RangeSpec) -> bool {
        match spec {
            RangeSpec::All => true,
            RangeSpec::Only(range) => self.supported_ranges().contains(&range),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Mode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "hefeng" => Ok(Mode::Hefeng),
            "openweather" => Ok(Mode::OpenWeather),
            "both" => Ok(Mode::Both),
            _ => Err(anyhow::anyhow!(
                "Unknown provider selection '{value}'. Choose one of: hefeng, openweather, both."
            )),
        }
    }
}

/// QWeather location identifier returned by the city lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One normalized observation, forecast day or forecast slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// City exactly as the caller supplied it.
    pub city: String,
    pub source: ProviderId,
    #[serde(rename = "data_range")]
    pub range: Range,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    #[serde(flatten)]
    pub reading: Reading,
}

impl WeatherRecord {
    pub fn new(city: &str, source: ProviderId, range: Range, reading: Reading) -> Self {
        Self {
            city: city.to_string(),
            source,
            range,
            date: None,
            time: None,
            reading,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn at(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn is_instant(&self) -> bool {
        matches!(self.reading, Reading::Instant(_))
    }
}

/// The two record shapes. A record never mixes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Instant(InstantReading),
    Daily(DailySummary),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantReading {
    pub temperature: f64,
    pub feels_like: f64,
    pub condition: String,
    pub humidity: u8,
    pub wind_speed: f64,
    pub wind_direction: String,
    pub pressure: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub temp_max: f64,
    pub temp_min: f64,
    pub condition_day: String,
    pub condition_night: String,
    pub humidity: u8,
    pub wind_speed_day: f64,
    pub wind_direction_day: String,
    pub wind_speed_night: f64,
    pub wind_direction_night: String,
    pub pressure: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant() -> InstantReading {
        InstantReading {
            temperature: 21.5,
            feels_like: 20.0,
            condition: "Clear".into(),
            humidity: 40,
            wind_speed: 3.2,
            wind_direction: "180".into(),
            pressure: 1012.0,
        }
    }

    #[test]
    fn range_spec_parses_all_and_concrete_tokens() {
        assert_eq!(RangeSpec::try_from("all").unwrap(), RangeSpec::All);
        assert_eq!(
            RangeSpec::try_from("next_15_days").unwrap(),
            RangeSpec::Only(Range::Next15Days)
        );
        assert!(RangeSpec::try_from("tomorrow").is_err());
    }

    #[test]
    fn openweather_mode_does_not_advertise_fifteen_days() {
        assert!(!Mode::OpenWeather.supports(RangeSpec::Only(Range::Next15Days)));
        assert!(Mode::Both.supports(RangeSpec::Only(Range::Next15Days)));
        assert!(Mode::OpenWeather.supports(RangeSpec::All));
    }

    #[test]
    fn both_mode_queries_hefeng_first() {
        assert_eq!(
            Mode::Both.providers(),
            &[ProviderId::Hefeng, ProviderId::OpenWeather]
        );
    }

    #[test]
    fn record_serializes_flat_with_original_keys() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let time = NaiveTime::from_hms_opt(15, 0, 0).unwrap();
        let record = WeatherRecord::new(
            "Beijing",
            ProviderId::OpenWeather,
            Range::NextWeek,
            Reading::Instant(instant()),
        )
        .on(date)
        .at(time);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source"], "openweather");
        assert_eq!(json["data_range"], "next_week");
        assert_eq!(json["date"], "2024-05-01");
        assert_eq!(json["time"], "15:00:00");
        assert_eq!(json["temperature"], 21.5);
        assert!(json.get("reading").is_none());
        assert!(json.get("temp_max").is_none());
    }

    #[test]
    fn instant_record_omits_date_and_time() {
        let record = WeatherRecord::new(
            "Beijing",
            ProviderId::Hefeng,
            Range::Today,
            Reading::Instant(instant()),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("date").is_none());
        assert!(json.get("time").is_none());
        assert!(record.is_instant());
    }
}
