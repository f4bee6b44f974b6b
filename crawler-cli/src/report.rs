use std::fmt::Write;

use crawler_core::{Reading, WeatherRecord};

const RULE: &str = "----------------------------------------";

/// Human-readable block for one record, ending with a separator rule.
pub fn render(record: &WeatherRecord) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_block(&mut out, record);
    out.push_str(RULE);
    out
}

fn write_block(out: &mut String, record: &WeatherRecord) -> std::fmt::Result {
    writeln!(out, "Source: {}", record.source.display_name())?;
    writeln!(out, "City: {}", record.city)?;
    if let Some(date) = record.date {
        writeln!(out, "Date: {date}")?;
    }
    if let Some(time) = record.time {
        writeln!(out, "Time: {time}")?;
    }

    match &record.reading {
        Reading::Instant(r) => {
            writeln!(out, "Temperature: {}°C", r.temperature)?;
            writeln!(out, "Feels Like: {}°C", r.feels_like)?;
            writeln!(out, "Condition: {}", r.condition)?;
            writeln!(out, "Humidity: {}%", r.humidity)?;
            writeln!(out, "Wind Speed: {} m/s", r.wind_speed)?;
            writeln!(out, "Wind Direction: {}", r.wind_direction)?;
            writeln!(out, "Pressure: {} hPa", r.pressure)?;
        }
        Reading::Daily(d) => {
            writeln!(out, "Max Temperature: {}°C", d.temp_max)?;
            writeln!(out, "Min Temperature: {}°C", d.temp_min)?;
            writeln!(out, "Day Condition: {}", d.condition_day)?;
            writeln!(out, "Night Condition: {}", d.condition_night)?;
            writeln!(out, "Humidity: {}%", d.humidity)?;
            writeln!(out, "Day Wind Speed: {} m/s", d.wind_speed_day)?;
            writeln!(out, "Day Wind Direction: {}", d.wind_direction_day)?;
            writeln!(out, "Night Wind Speed: {} m/s", d.wind_speed_night)?;
            writeln!(out, "Night Wind Direction: {}", d.wind_direction_night)?;
            writeln!(out, "Pressure: {} hPa", d.pressure)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use crawler_core::{DailySummary, InstantReading, ProviderId, Range};

    #[test]
    fn instant_slot_shows_date_time_and_temperature() {
        let record = WeatherRecord::new(
            "Beijing",
            ProviderId::OpenWeather,
            Range::NextWeek,
            Reading::Instant(InstantReading {
                temperature: 18.5,
                feels_like: 17.0,
                condition: "Rain".into(),
                humidity: 60,
                wind_speed: 2.0,
                wind_direction: "90".into(),
                pressure: 1009.0,
            }),
        )
        .on(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap())
        .at(NaiveTime::from_hms_opt(15, 0, 0).unwrap());

        let text = render(&record);
        assert!(text.starts_with("Source: OpenWeatherMap\nCity: Beijing\n"));
        assert!(text.contains("Date: 2024-05-02\nTime: 15:00:00\n"));
        assert!(text.contains("Temperature: 18.5°C"));
        assert!(!text.contains("Max Temperature"));
        assert!(text.ends_with(RULE));
    }

    #[test]
    fn daily_summary_shows_day_and_night() {
        let record = WeatherRecord::new(
            "北京",
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
        .on(NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());

        let text = render(&record);
        assert!(text.contains("Max Temperature: 28°C"));
        assert!(text.contains("Night Condition: 晴"));
        assert!(!text.contains("Time:"));
        assert!(!text.contains("Feels Like"));
    }
}
