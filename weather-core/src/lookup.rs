use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::{
    Config, Location, LocationResolver, WeatherError, WeatherProvider, WeatherRecord,
    provider::provider_from_config,
};

/// A resolved location together with its current conditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub location: Location,
    pub weather: WeatherRecord,
}

/// The resolve → fetch pipeline over one provider.
#[derive(Debug, Clone)]
pub struct WeatherLookup {
    resolver: LocationResolver,
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherLookup {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { resolver: LocationResolver::new(provider.clone()), provider }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(provider_from_config(config)?))
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub async fn lookup(&self, input: &str) -> Result<Report, WeatherError> {
        let location = self.resolver.resolve(input).await?;
        let weather = self.provider.current(&location).await?;
        info!(location = %location.display_name(), condition = %weather.condition, "lookup finished");
        Ok(Report { location, weather })
    }
}
