use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use crawler_core::{
    Aggregation, Aggregator, Mode, Settings,
    sink::{SqliteSink, write_json},
};

use crate::{configure, report};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-crawler",
    version,
    about = "Fetch weather from QWeather and OpenWeatherMap into one record set"
)]
pub struct Cli {
    /// Settings file to use instead of the platform default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively edit API keys, city, providers, range and database settings.
    Configure,

    /// Fetch weather for the configured city and save the results.
    Fetch(FetchArgs),
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// City to query instead of the configured one.
    #[arg(long)]
    pub city: Option<String>,

    /// Provider selection: hefeng, openweather or both.
    #[arg(long, value_parser = parse_mode)]
    pub api: Option<Mode>,

    /// Data range: today, next_week, next_15_days or all.
    #[arg(long)]
    pub range: Option<String>,

    /// Do not write the JSON document.
    #[arg(long)]
    pub no_save: bool,

    /// Write to the database even if it is disabled in the settings.
    #[arg(long)]
    pub database: bool,
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    Mode::try_from(value).map_err(|e| e.to_string())
}

impl FetchArgs {
    /// Command-line flags override the stored settings for this run only.
    fn apply(&self, settings: &mut Settings) {
        if let Some(city) = &self.city {
            settings.weather.city = Some(city.clone());
        }
        if let Some(mode) = self.api {
            settings.weather.selected_api = mode;
        }
        if let Some(range) = &self.range {
            settings.weather.data_range = range.clone();
        }
        if self.database {
            settings.database.enabled = true;
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Settings::config_file_path()?,
        };

        match self.command {
            Command::Configure => configure::run(&config_path),
            Command::Fetch(args) => fetch(&config_path, &args).await,
        }
    }
}

async fn fetch(config_path: &Path, args: &FetchArgs) -> anyhow::Result<()> {
    tracing::debug!(path = %config_path.display(), "loading settings");
    let mut settings = Settings::load_from(config_path)?;
    args.apply(&mut settings);

    let city = settings.city()?.to_string();
    let token = settings.weather.data_range.clone();
    let aggregator = Aggregator::from_settings(&settings)?;

    let outcome = aggregator.aggregate_token(&city, settings.mode(), &token).await;

    for record in &outcome.records {
        println!("{}", report::render(record));
    }
    print_failures(&outcome);

    // Sinks run only once every fetch has finished.
    if !args.no_save {
        let path = write_json(
            &outcome.records,
            &settings.output.dir,
            &city,
            &token,
            chrono::Local::now(),
        )?;
        println!("Weather data saved to {}", path.display());
    }

    if settings.database.enabled {
        let mut sink = SqliteSink::open(&settings.database.path)?;
        let written = sink
            .insert_all(&outcome.records)
            .context("Failed to write weather data to the database")?;
        println!(
            "{written} record(s) written to {}",
            settings.database.path.display()
        );
    }

    Ok(())
}

fn print_failures(outcome: &Aggregation) {
    if outcome.failures.is_empty() {
        return;
    }

    eprintln!("{} call(s) returned no data:", outcome.failures.len());
    for failure in &outcome.failures {
        let provider = failure.provider.map(|p| p.display_name()).unwrap_or("-");
        let range = failure.range.map(|r| r.as_str()).unwrap_or("-");
        eprintln!("  [{}] {provider} {range}: {}", failure.kind, failure.message);
    }
}
