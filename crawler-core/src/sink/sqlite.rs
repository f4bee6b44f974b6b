//! SQLite sink: one wide `weather_data` table holding both record shapes.

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use std::path::Path;

use crate::model::{DailySummary, InstantReading, Reading, WeatherRecord};

/// Columns are the union of both record shapes; only city, source and
/// data_range are mandatory.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS weather_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    city TEXT NOT NULL,
    source TEXT NOT NULL,
    data_range TEXT NOT NULL,
    date TEXT,
    time TEXT,
    temperature REAL,
    feels_like REAL,
    condition TEXT,
    humidity INTEGER,
    wind_speed REAL,
    wind_direction TEXT,
    pressure REAL,
    temp_max REAL,
    temp_min REAL,
    condition_day TEXT,
    condition_night TEXT,
    wind_speed_day REAL,
    wind_direction_day TEXT,
    wind_speed_night REAL,
    wind_direction_night TEXT
);
"#;

const INSERT_SQL: &str = "
INSERT INTO weather_data (
    city, source, data_range, date, time, temperature, feels_like, condition,
    humidity, wind_speed, wind_direction, pressure, temp_max, temp_min,
    condition_day, condition_night, wind_speed_day, wind_direction_day,
    wind_speed_night, wind_direction_night
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
";

pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Open (or create) the database and make sure the table exists.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to create weather_data table")?;
        Ok(Self { conn })
    }

    pub fn insert(&self, record: &WeatherRecord) -> Result<()> {
        insert_row(&self.conn, record)
    }

    /// Insert all records in a single transaction.
    pub fn insert_all(&mut self, records: &[WeatherRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for record in records {
            insert_row(&tx, record)?;
        }
        tx.commit().context("Failed to commit weather rows")?;

        tracing::info!(count = records.len(), "weather data written to database");
        Ok(records.len())
    }

    pub fn row_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM weather_data", [], |row| row.get(0))?)
    }
}

fn insert_row(conn: &Connection, record: &WeatherRecord) -> Result<()> {
    let empty_instant = None::<&InstantReading>;
    let empty_daily = None::<&DailySummary>;
    let (now, day) = match &record.reading {
        Reading::Instant(r) => (Some(r), empty_daily),
        Reading::Daily(d) => (empty_instant, Some(d)),
    };

    let date = record.date.map(|d| d.format("%Y-%m-%d").to_string());
    let time = record.time.map(|t| t.format("%H:%M:%S").to_string());
    let humidity = now.map(|r| r.humidity).or(day.map(|d| d.humidity));
    let pressure = now.map(|r| r.pressure).or(day.map(|d| d.pressure));

    conn.execute(
        INSERT_SQL,
        params![
            record.city,
            record.source.as_str(),
            record.range.as_str(),
            date,
            time,
            now.map(|r| r.temperature),
            now.map(|r| r.feels_like),
            now.map(|r| r.condition.as_str()),
            humidity,
            now.map(|r| r.wind_speed),
            now.map(|r| r.wind_direction.as_str()),
            pressure,
            day.map(|d| d.temp_max),
            day.map(|d| d.temp_min),
            day.map(|d| d.condition_day.as_str()),
            day.map(|d| d.condition_night.as_str()),
            day.map(|d| d.wind_speed_day),
            day.map(|d| d.wind_direction_day.as_str()),
            day.map(|d| d.wind_speed_night),
            day.map(|d| d.wind_direction_night.as_str()),
        ],
    )
    .with_context(|| format!("Failed to insert {} record for {}", record.source, record.city))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::Range, provider::ProviderId};
    use chrono::{NaiveDate, NaiveTime};

    fn slot() -> WeatherRecord {
        WeatherRecord::new(
            "Beijing",
            ProviderId::OpenWeather,
            Range::NextWeek,
            Reading::Instant(InstantReading {
                temperature: 18.0,
                feels_like: 17.0,
                condition: "Rain".into(),
                humidity: 60,
                wind_speed: 2.0,
                wind_direction: "90".into(),
                pressure: 1009.0,
            }),
        )
        .on(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap())
        .at(NaiveTime::from_hms_opt(15, 0, 0).unwrap())
    }

    fn day() -> WeatherRecord {
        WeatherRecord::new(
            "Beijing",
            ProviderId::Hefeng,
            Range::Next15Days,
            Reading::Daily(DailySummary {
                temp_max: 28.0,
                temp_min: 15.0,
                condition_day: "多云".into(),
                condition_night: "晴".into(),
                humidity: 55,
                wind_speed_day: 3.0,
                wind_direction_day: "北风".into(),
                wind_speed_night: 1.0,
                wind_direction_night: "南风".into(),
                pressure: 1010.0,
            }),
        )
        .on(NaiveDate::from_ymd_opt(2024, 5, 3).unwrap())
    }

    #[test]
    fn instant_row_leaves_daily_columns_null() {
        let sink = SqliteSink::open_in_memory().unwrap();
        sink.insert(&slot()).unwrap();

        let (time, temperature, temp_max): (Option<String>, Option<f64>, Option<f64>) = sink
            .conn
            .query_row(
                "SELECT time, temperature, temp_max FROM weather_data",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();

        assert_eq!(time.as_deref(), Some("15:00:00"));
        assert_eq!(temperature, Some(18.0));
        assert_eq!(temp_max, None);
    }

    #[test]
    fn daily_row_leaves_instant_columns_null() {
        let sink = SqliteSink::open_in_memory().unwrap();
        sink.insert(&day()).unwrap();

        let (source, range, temperature, humidity, night): (
            String,
            String,
            Option<f64>,
            Option<i64>,
            Option<String>,
        ) = sink
            .conn
            .query_row(
                "SELECT source, data_range, temperature, humidity, condition_night FROM weather_data",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .unwrap();

        assert_eq!(source, "hefeng");
        assert_eq!(range, "next_15_days");
        assert_eq!(temperature, None);
        assert_eq!(humidity, Some(55));
        assert_eq!(night.as_deref(), Some("晴"));
    }

    #[test]
    fn reopening_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db").join("weather.db");

        let mut sink = SqliteSink::open(&path).unwrap();
        assert_eq!(sink.insert_all(&[slot(), day()]).unwrap(), 2);
        drop(sink);

        let sink = SqliteSink::open(&path).unwrap();
        assert_eq!(sink.row_count().unwrap(), 2);
    }
}
