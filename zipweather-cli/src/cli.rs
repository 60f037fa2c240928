use anyhow::Context;
use chrono::DateTime;
use clap::{Parser, Subcommand};
use inquire::Password;
use tracing::debug;
use zipweather_core::{Config, WeatherOutcome, WeatherService};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "zipweather", version, about = "Current weather by US zip code")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the config file.
    Configure,

    /// Show current weather for one or more zip codes.
    Show {
        /// Zip codes, looked up in order through one shared cache.
        #[arg(required = true)]
        zips: Vec<String>,

        /// Print each outcome as a JSON object.
        #[arg(long)]
        json: bool,
    },

    /// Print the location of the config file.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { zips, json } => show(&zips, json).await,
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(api_key.trim().to_string());
    config.save()?;

    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(zips: &[String], json: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    debug!(rate_limit = ?config.rate_limit, cache = ?config.cache, "Loaded configuration");

    let service = WeatherService::from_config(&config);

    for zip in zips {
        let outcome = service.latest(zip).await;
        if json {
            let line = serde_json::to_string(&outcome).context("Failed to serialize outcome")?;
            println!("{line}");
        } else {
            println!("{}", render(zip, &outcome));
        }
    }

    Ok(())
}

fn render(zip: &str, outcome: &WeatherOutcome) -> String {
    match outcome {
        WeatherOutcome::Success(report) | WeatherOutcome::StaleFallback(report) => {
            let observed = DateTime::from_timestamp(report.observed_at, 0)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| report.observed_at.to_string());
            let stale = if matches!(outcome, WeatherOutcome::StaleFallback(_)) {
                " (stale, provider unavailable)"
            } else {
                ""
            };
            format!(
                "{zip}: temp {}, humidity {}%, wind {} | observed {observed}, {}s old{stale}",
                report.temperature, report.humidity, report.wind_speed, report.data_age_seconds,
            )
        }
        WeatherOutcome::Failure(reason) => format!("{zip}: error: {reason}"),
    }
}
