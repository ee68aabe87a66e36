use anyhow::{Context, Result, anyhow, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::model::Units;

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Where and how the weather provider is contacted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub geocoding_url: String,
    pub forecast_url: String,
    /// Language of geocoding results, e.g. "en".
    pub language: String,
    pub timeout_secs: u64,
    pub retry_backoff_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            language: "en".to_string(),
            timeout_secs: 5,
            retry_backoff_ms: 500,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub max_entries: usize,
    /// Overrides the platform data directory location.
    pub path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { enabled: true, max_entries: 50, path: None }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [provider]
/// timeout_secs = 5
///
/// [units]
/// temperature = "fahrenheit"
/// wind_speed = "mph"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub units: Units,
    pub history: HistoryConfig,
}

impl Config {
    /// Load config from the platform location, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
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

    pub fn validate(&self) -> Result<()> {
        ensure!(self.provider.timeout_secs > 0, "provider.timeout_secs must be greater than zero");
        ensure!(self.history.max_entries > 0, "history.max_entries must be greater than zero");
        ensure!(!self.provider.forecast_url.is_empty(), "provider.forecast_url must not be empty");
        ensure!(!self.provider.geocoding_url.is_empty(), "provider.geocoding_url must not be empty");
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the search history file, honouring `history.path`.
    pub fn history_file_path(&self) -> Result<PathBuf> {
        match &self.history.path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("history.json")),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weather-tui", "weather-tui")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TemperatureUnit, WindSpeedUnit};

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.provider.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.history.max_entries, 50);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[units]\ntemperature = \"fahrenheit\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.units.temperature, TemperatureUnit::Fahrenheit);
        assert_eq!(cfg.units.wind_speed, WindSpeedUnit::Kmh);
        assert_eq!(cfg.provider.forecast_url, DEFAULT_FORECAST_URL);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.units.wind_speed = WindSpeedUnit::Mph;
        cfg.provider.timeout_secs = 9;
        cfg.history.enabled = false;
        cfg.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn history_path_override() {
        let mut cfg = Config::default();
        cfg.history.path = Some(PathBuf::from("/tmp/weather-history.json"));
        assert_eq!(cfg.history_file_path().unwrap(), PathBuf::from("/tmp/weather-history.json"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[provider]\ntimeout_secs = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("timeout_secs must be greater than zero"));
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "units = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
