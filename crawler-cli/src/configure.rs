//! Interactive settings editor. Empty answers keep the current value.

use std::path::Path;

use anyhow::Result;
use crawler_core::{Mode, ProviderId, Settings};
use inquire::{Confirm, Select, Text};

const KEEP_HINT: &str = "leave empty to keep the current value";

pub fn run(path: &Path) -> Result<()> {
    let mut settings = Settings::load_from(path)?;

    for &id in ProviderId::all() {
        let current = settings.provider_api_key(id).map(mask);
        let prompt = format!("{} API key:", id.display_name());
        let mut question = Text::new(&prompt).with_help_message(KEEP_HINT);
        if let Some(current) = current.as_deref() {
            question = question.with_placeholder(current);
        }
        if let Some(key) = non_empty(&question.prompt()?) {
            settings.upsert_provider_api_key(id, key);
        }
    }

    let current_city = settings.weather.city.clone().unwrap_or_default();
    let city = Text::new("City to query:")
        .with_default(&current_city)
        .prompt()?;
    if let Some(city) = non_empty(&city) {
        settings.weather.city = Some(city);
    }

    let modes = Mode::all().to_vec();
    let cursor = modes
        .iter()
        .position(|m| *m == settings.mode())
        .unwrap_or_default();
    settings.weather.selected_api = Select::new("Which API should be used?", modes)
        .with_starting_cursor(cursor)
        .prompt()?;

    let choices = range_choices(settings.mode());
    let cursor = choices
        .iter()
        .position(|c| *c == settings.weather.data_range)
        .unwrap_or_default();
    let range = Select::new("Which data range should be fetched?", choices)
        .with_starting_cursor(cursor)
        .prompt()?;
    settings.set_data_range(range)?;

    let current_dir = settings.output.dir.display().to_string();
    let dir = Text::new("Directory for JSON output:")
        .with_default(&current_dir)
        .prompt()?;
    if let Some(dir) = non_empty(&dir) {
        settings.output.dir = dir.into();
    }

    settings.database.enabled = Confirm::new("Write results to the SQLite database?")
        .with_default(settings.database.enabled)
        .prompt()?;
    if settings.database.enabled {
        let current_db = settings.database.path.display().to_string();
        let db = Text::new("Database file:")
            .with_default(&current_db)
            .prompt()?;
        if let Some(db) = non_empty(&db) {
            settings.database.path = db.into();
        }
    }

    settings.save_to(path)?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

/// Ranges offered for a mode: the ones it supports, then `all`.
fn range_choices(mode: Mode) -> Vec<&'static str> {
    mode.supported_ranges()
        .iter()
        .map(|r| r.as_str())
        .chain(std::iter::once("all"))
        .collect()
}

fn non_empty(answer: &str) -> Option<String> {
    let trimmed = answer.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Show only the last four characters of a stored key.
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{tail}", "*".repeat(chars.len() - 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openweather_is_not_offered_fifteen_days() {
        assert_eq!(
            range_choices(Mode::OpenWeather),
            vec!["today", "next_week", "all"]
        );
        assert_eq!(
            range_choices(Mode::Both),
            vec!["today", "next_week", "next_15_days", "all"]
        );
    }

    #[test]
    fn blank_answers_keep_current_values() {
        assert_eq!(non_empty("   "), None);
        assert_eq!(non_empty(" Beijing "), Some("Beijing".to_string()));
    }

    #[test]
    fn mask_hides_all_but_the_tail() {
        assert_eq!(mask("abcdef123456"), "********3456");
        assert_eq!(mask("abc"), "***");
    }
}
