use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::WeatherRecord;

/// `<city>_<range|all>_<YYYYmmddHHMMSS>.json`
pub fn output_file_name(city: &str, range_label: &str, at: DateTime<Local>) -> String {
    format!("{}_{}_{}.json", city, range_label, at.format("%Y%m%d%H%M%S"))
}

/// Write one run's records as a pretty JSON array under `dir`.
pub fn write_json(
    records: &[WeatherRecord],
    dir: &Path,
    city: &str,
    range_label: &str,
    at: DateTime<Local>,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let path = dir.join(output_file_name(city, range_label, at));
    let json = serde_json::to_string_pretty(records).context("Failed to serialize records")?;

    fs::write(&path, json)
        .with_context(|| format!("Failed to write weather data: {}", path.display()))?;

    tracing::info!(path = %path.display(), count = records.len(), "weather data saved");
    Ok(path)
}
