use anyhow::Result;
use chrono::{Local, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::warn;
use weather_core::{Config, SearchHistory, TemperatureUnit, WeatherLookup, WindSpeedUnit};

use crate::{
    configure, logging,
    present::{OutputFormat, render},
    tui,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-tui", version, about = "Current weather for any place, in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// City name, "City, Country", postal code or "lat,lon".
    /// Starts the interactive UI when omitted.
    pub location: Option<String>,

    /// Print the report as JSON.
    #[arg(long, requires = "location")]
    pub json: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Read configuration from this file instead of the default location.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Temperature unit: celsius or fahrenheit.
    #[arg(long, global = true)]
    pub units: Option<TemperatureUnit>,

    /// Wind speed unit: kmh, ms, mph or kn.
    #[arg(long, global = true)]
    pub wind: Option<WindSpeedUnit>,

    /// Request timeout in seconds.
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// More log output on stderr (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalOpts {
    fn load_config(&self, path: &Path) -> Result<Config> {
        let mut config = Config::load_from(path)?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Command-line flags win over the config file.
    fn apply(&self, config: &mut Config) {
        if let Some(units) = self.units {
            config.units.temperature = units;
        }
        if let Some(wind) = self.wind {
            config.units.wind_speed = wind;
        }
        if let Some(timeout) = self.timeout {
            config.provider.timeout_secs = timeout;
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the current weather for a location and exit.
    Show {
        location: String,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Open the interactive search UI.
    Tui,

    /// List past searches.
    History {
        /// Forget all past searches.
        #[arg(long)]
        clear: bool,
    },

    /// Interactively edit the configuration file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let command = match (self.command, self.location) {
            (Some(command), _) => command,
            (None, Some(location)) => Command::Show { location, json: self.json },
            (None, None) => Command::Tui,
        };

        // Log lines on stderr would tear up the alternate screen.
        if !matches!(command, Command::Tui) {
            logging::init(self.global.verbose)?;
        }

        let config_path = match &self.global.config {
            Some(path) => path.clone(),
            None => Config::config_file_path()?,
        };
        let config = match self.global.load_config(&config_path) {
            Ok(config) => config,
            // `configure` is how a broken file gets repaired.
            Err(err) if matches!(command, Command::Configure) => {
                warn!("starting from default settings: {err:#}");
                let mut config = Config::default();
                self.global.apply(&mut config);
                config
            }
            Err(err) => return Err(err),
        };

        match command {
            Command::Show { location, json } => {
                let format = if json { OutputFormat::Json } else { OutputFormat::Text };
                show(&config, &location, format).await
            }
            Command::Tui => tui::run(config).await,
            Command::History { clear } => history(&config, clear),
            Command::Configure => configure::run(&config, &config_path),
        }
    }
}

async fn show(config: &Config, location: &str, format: OutputFormat) -> Result<()> {
    let lookup = WeatherLookup::from_config(config)?;
    let report = lookup.lookup(location).await?;

    render(&mut io::stdout().lock(), &report, format)?;

    if config.history.enabled {
        record_history(config, location);
    }
    Ok(())
}

/// Failing to remember a search never fails the lookup itself.
fn record_history(config: &Config, query: &str) {
    let path = match config.history_file_path() {
        Ok(path) => path,
        Err(err) => {
            warn!("search history unavailable: {err:#}");
            return;
        }
    };

    let mut history = SearchHistory::load_or_empty(path, config.history.max_entries);
    history.record(query, Utc::now());
    if let Err(err) = history.save() {
        warn!("failed to save search history: {err:#}");
    }
}

fn history(config: &Config, clear: bool) -> Result<()> {
    let mut history =
        SearchHistory::load_or_empty(config.history_file_path()?, config.history.max_entries);

    let mut out = io::stdout().lock();
    if clear {
        history.clear();
        history.save()?;
        writeln!(out, "Search history cleared.")?;
        return Ok(());
    }

    print_history(&mut out, &history)?;
    Ok(())
}

fn print_history<W: Write>(out: &mut W, history: &SearchHistory) -> io::Result<()> {
    if history.is_empty() {
        writeln!(out, "No searches yet.")?;
    }
    for entry in history.entries() {
        let when = entry.searched_at.with_timezone(&Local);
        writeln!(out, "{}  {}", when.format("%Y-%m-%d %H:%M"), entry.query)?;
    }
    out.flush()
}
