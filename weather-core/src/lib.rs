//! Core library for the `weather-tui` tool.
//!
//! This crate defines:
//! - Shared domain models (locations, weather records, units)
//! - Location resolution from free-text input
//! - The weather provider abstraction and its Open-Meteo client
//! - Configuration and search history persistence
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod history;
pub mod lookup;
pub mod model;
pub mod provider;
pub mod resolver;

pub use config::{Config, HistoryConfig, ProviderConfig};
pub use error::WeatherError;
pub use history::{HistoryEntry, SearchHistory};
pub use lookup::{Report, WeatherLookup};
pub use model::{
    GeoMatch, Location, ReportedUnits, TemperatureUnit, Units, WeatherCondition, WeatherRecord,
    WindSpeedUnit,
};
pub use provider::{WeatherProvider, open_meteo::OpenMeteoProvider, provider_from_config};
pub use resolver::{LocationQuery, LocationResolver};
