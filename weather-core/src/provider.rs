use crate::{
    Config, GeoMatch, Location, WeatherError, WeatherRecord,
    provider::open_meteo::OpenMeteoProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod open_meteo;

/// A source of geocoding results and current conditions.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Geocode `name`, best candidates first, at most `limit` of them.
    async fn search(&self, name: &str, limit: usize) -> Result<Vec<GeoMatch>, WeatherError>;

    /// Fetch the current conditions at `location`.
    async fn current(&self, location: &Location) -> Result<WeatherRecord, WeatherError>;
}

/// Construct the provider described by `config`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let provider = OpenMeteoProvider::new(&config.provider, config.units)?;
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_default_config() {
        let provider = provider_from_config(&Config::default());
        assert!(provider.is_ok());
    }
}
