//! Interactive `configure` command.

use anyhow::{Context, Result, ensure};
use inquire::{Confirm, CustomType, Select, validator::Validation};
use std::{
    io::{self, IsTerminal},
    path::Path,
};
use weather_core::{Config, TemperatureUnit, WindSpeedUnit};

/// Prompt for the user-facing settings, starting from `current`, and save
/// the result to `path`.
pub fn run(current: &Config, path: &Path) -> Result<()> {
    ensure!(io::stdin().is_terminal(), "configure needs an interactive terminal");
    let mut config = current.clone();

    let units = TemperatureUnit::all();
    config.units.temperature = Select::new("Temperature unit:", units.to_vec())
        .with_starting_cursor(position(units, &config.units.temperature))
        .prompt()
        .context("Failed to read temperature unit")?;

    let winds = WindSpeedUnit::all();
    config.units.wind_speed = Select::new("Wind speed unit:", winds.to_vec())
        .with_starting_cursor(position(winds, &config.units.wind_speed))
        .prompt()
        .context("Failed to read wind speed unit")?;

    config.provider.timeout_secs = CustomType::<u64>::new("Request timeout in seconds:")
        .with_default(config.provider.timeout_secs)
        .with_error_message("Please enter a whole number of seconds")
        .with_validator(|secs: &u64| {
            if *secs > 0 {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid("Timeout must be greater than zero".into()))
            }
        })
        .prompt()
        .context("Failed to read timeout")?;

    config.history.enabled = Confirm::new("Remember searches?")
        .with_default(config.history.enabled)
        .prompt()
        .context("Failed to read history preference")?;

    config.validate()?;
    config.save_to(path)?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

fn position<T: PartialEq>(options: &[T], current: &T) -> usize {
    options.iter().position(|o| o == current).unwrap_or(0)
}
