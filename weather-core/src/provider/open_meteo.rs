use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::{
    GeoMatch, Location, WeatherError, WeatherRecord,
    config::ProviderConfig,
    model::{ReportedUnits, Units, WeatherCondition},
};

use super::WeatherProvider;

/// Attempts per request: the first try plus one retry on transient failure.
const MAX_ATTEMPTS: u32 = 2;

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
    precipitation,weather_code,wind_speed_10m,pressure_msl";

/// Open-Meteo geocoding and forecast client. No API key required.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    geocoding_url: String,
    forecast_url: String,
    language: String,
    units: Units,
    retry_backoff: Duration,
}

impl OpenMeteoProvider {
    pub fn new(config: &ProviderConfig, units: Units) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("weather-tui/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            geocoding_url: config.geocoding_url.clone(),
            forecast_url: config.forecast_url.clone(),
            language: config.language.clone(),
            units,
            retry_backoff: config.retry_backoff(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, WeatherError> {
        let (status, body) =
            retry_transient(self.retry_backoff, what, || self.fetch(url, query)).await?;

        if !status.is_success() {
            return Err(WeatherError::provider(format!(
                "{what} request failed with status {status}: {}",
                error_reason(&body),
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| WeatherError::provider(format!("failed to parse {what} response: {e}")))
    }

    /// One attempt: the request and its whole body, both under the client timeout.
    async fn fetch(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> reqwest::Result<(StatusCode, String)> {
        let res = self.http.get(url).query(query).send().await?;
        let status = res.status();
        let body = res.text().await?;
        Ok((status, body))
    }
}

/// Run `attempt`, repeating it once after `backoff` if it fails with a
/// timeout or a connect error.
async fn retry_transient<T, F, Fut>(
    backoff: Duration,
    what: &str,
    mut attempt: F,
) -> Result<T, WeatherError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = reqwest::Result<T>>,
{
    let mut tries = 1;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if tries < MAX_ATTEMPTS && is_transient(&err) => {
                warn!(
                    attempt = tries,
                    backoff_ms = backoff.as_millis() as u64,
                    "{what} request failed, retrying: {err}"
                );
                tokio::time::sleep(backoff).await;
                tries += 1;
            }
            Err(err) => return Err(WeatherError::from_transport(&err, what)),
        }
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Open-Meteo reports errors as `{"error": true, "reason": "..."}`.
fn error_reason(body: &str) -> String {
    #[derive(Deserialize)]
    struct OmError {
        reason: String,
    }

    match serde_json::from_str::<OmError>(body) {
        Ok(e) => e.reason,
        Err(_) => truncate_body(body),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct OmGeocodingResponse {
    results: Option<Vec<OmGeoResult>>,
}

#[derive(Debug, Deserialize)]
struct OmGeoResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    country_code: Option<String>,
    admin1: Option<String>,
    timezone: Option<String>,
}

impl From<OmGeoResult> for GeoMatch {
    fn from(r: OmGeoResult) -> Self {
        GeoMatch {
            name: r.name,
            latitude: r.latitude,
            longitude: r.longitude,
            country: r.country,
            country_code: r.country_code,
            admin1: r.admin1,
            timezone: r.timezone,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    time: Option<i64>,
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    precipitation: Option<f64>,
    weather_code: Option<u8>,
    wind_speed_10m: Option<f64>,
    pressure_msl: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OmCurrentUnits {
    temperature_2m: Option<String>,
    wind_speed_10m: Option<String>,
    pressure_msl: Option<String>,
    precipitation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    #[serde(default)]
    utc_offset_seconds: i32,
    current: Option<OmCurrent>,
    current_units: Option<OmCurrentUnits>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, WeatherError> {
    value.ok_or_else(|| {
        WeatherError::provider(format!("forecast response is missing field `{field}`"))
    })
}

impl TryFrom<OmForecastResponse> for WeatherRecord {
    type Error = WeatherError;

    fn try_from(res: OmForecastResponse) -> Result<Self, Self::Error> {
        let current = required(res.current, "current")?;
        let units = required(res.current_units, "current_units")?;

        let time = required(current.time, "current.time")?;
        let observed_at: DateTime<Utc> = DateTime::from_timestamp(time, 0).ok_or_else(|| {
            WeatherError::provider(format!("forecast response has invalid time {time}"))
        })?;
        let humidity = required(current.relative_humidity_2m, "current.relative_humidity_2m")?;

        Ok(WeatherRecord {
            observed_at,
            utc_offset_seconds: res.utc_offset_seconds,
            temperature: required(current.temperature_2m, "current.temperature_2m")?,
            apparent_temperature: required(
                current.apparent_temperature,
                "current.apparent_temperature",
            )?,
            condition: WeatherCondition(required(current.weather_code, "current.weather_code")?),
            wind_speed: required(current.wind_speed_10m, "current.wind_speed_10m")?,
            humidity_pct: humidity.round().clamp(0.0, 100.0) as u8,
            pressure: required(current.pressure_msl, "current.pressure_msl")?,
            precipitation: required(current.precipitation, "current.precipitation")?,
            units: ReportedUnits {
                temperature: required(units.temperature_2m, "current_units.temperature_2m")?,
                wind_speed: required(units.wind_speed_10m, "current_units.wind_speed_10m")?,
                pressure: required(units.pressure_msl, "current_units.pressure_msl")?,
                precipitation: required(units.precipitation, "current_units.precipitation")?,
            },
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn search(&self, name: &str, limit: usize) -> Result<Vec<GeoMatch>, WeatherError> {
        let query = [
            ("name", name.to_string()),
            ("count", limit.to_string()),
            ("language", self.language.clone()),
            ("format", "json".to_string()),
        ];

        let parsed: OmGeocodingResponse =
            self.get_json(&self.geocoding_url, &query, "geocoding").await?;
        let matches: Vec<GeoMatch> =
            parsed.results.unwrap_or_default().into_iter().map(GeoMatch::from).collect();

        debug!(query = name, found = matches.len(), "geocoding search finished");
        Ok(matches)
    }

    async fn current(&self, location: &Location) -> Result<WeatherRecord, WeatherError> {
        let started = Instant::now();
        let query = [
            ("latitude", location.latitude().to_string()),
            ("longitude", location.longitude().to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("temperature_unit", self.units.temperature.as_str().to_string()),
            ("wind_speed_unit", self.units.wind_speed.as_str().to_string()),
            ("precipitation_unit", "mm".to_string()),
            ("timeformat", "unixtime".to_string()),
            ("timezone", "auto".to_string()),
        ];

        let parsed: OmForecastResponse =
            self.get_json(&self.forecast_url, &query, "forecast").await?;
        let record = WeatherRecord::try_from(parsed)?;

        info!(
            location = %location.display_name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetched current weather"
        );
        Ok(record)
    }
}
