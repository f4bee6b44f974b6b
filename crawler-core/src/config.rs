use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    model::{Mode, RangeSpec},
    provider::{Endpoints, ProviderId},
};

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// What to fetch: city, provider selection and range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub city: Option<String>,
    pub selected_api: Mode,
    /// Kept as raw text; an unknown token is reported at fetch time.
    pub data_range: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            city: None,
            selected_api: Mode::Both,
            data_range: "today".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("weather.db"),
        }
    }
}

/// Top-level settings stored on disk.
///
/// Example TOML:
/// ```toml
/// [weather]
/// city = "Beijing"
/// selected_api = "both"
/// data_range = "all"
///
/// [providers.hefeng]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub weather: WeatherConfig,
    pub providers: HashMap<String, ProviderConfig>,
    pub output: OutputConfig,
    pub database: DatabaseConfig,
    pub endpoints: Endpoints,
}

impl Settings {
    /// The configured city, or a hint on how to set one.
    pub fn city(&self) -> Result<&str> {
        self.weather
            .city
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No city configured.\n\
                     Hint: run `weather-crawler configure` or pass `--city <NAME>`."
                )
            })
    }

    pub fn mode(&self) -> Mode {
        self.weather.selected_api
    }

    /// Set the range token, accepting only `all` or a range the current
    /// mode supports.
    pub fn set_data_range(&mut self, token: &str) -> Result<()> {
        let spec = RangeSpec::try_from(token)?;
        let mode = self.mode();
        if !mode.supports(spec) {
            bail!("Data range '{spec}' is not available when using '{mode}'.");
        }
        self.weather.data_range = spec.as_str().to_string();
        Ok(())
    }

    /// Load settings from the platform config dir, or defaults on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load settings from an explicit path, or defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(settings)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-crawler", "weather-crawler")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set or replace a provider API key.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers
            .insert(provider_id.as_str().to_string(), ProviderConfig { api_key });
    }

    /// Returns the API key for a provider, if present and non-empty.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers
            .get(provider_id.as_str())
            .map(|cfg| cfg.api_key.as_str())
            .filter(|key| !key.is_empty())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }
}
