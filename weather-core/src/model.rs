use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// One geocoding candidate as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoMatch {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub admin1: Option<String>,
    pub timezone: Option<String>,
}

impl GeoMatch {
    /// Label used for suggestions, e.g. `Paris, Ile-de-France (France)`.
    pub fn label(&self) -> String {
        display_name(&self.name, self.admin1.as_deref(), self.country.as_deref())
    }

    /// Text placed in the search box when the suggestion is accepted.
    pub fn query_text(&self) -> String {
        match &self.country {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name.clone(),
        }
    }
}

/// A resolved place. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    query: String,
    name: String,
    region: Option<String>,
    country: Option<String>,
    latitude: f64,
    longitude: f64,
    timezone: Option<String>,
}

impl Location {
    pub fn from_match(query: impl Into<String>, found: GeoMatch) -> Self {
        Self {
            query: query.into(),
            name: found.name,
            region: found.admin1,
            country: found.country,
            latitude: found.latitude,
            longitude: found.longitude,
            timezone: found.timezone,
        }
    }

    pub fn from_coordinates(query: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            query: query.into(),
            name: format!("{latitude:.4}, {longitude:.4}"),
            region: None,
            country: None,
            latitude,
            longitude,
            timezone: None,
        }
    }

    /// The raw text the user typed.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }

    pub fn display_name(&self) -> String {
        display_name(&self.name, self.region.as_deref(), self.country.as_deref())
    }
}

fn display_name(name: &str, region: Option<&str>, country: Option<&str>) -> String {
    let mut out = name.to_string();
    if let Some(region) = region.filter(|r| !r.is_empty() && *r != name) {
        out.push_str(", ");
        out.push_str(region);
    }
    if let Some(country) = country.filter(|c| !c.is_empty()) {
        out.push_str(&format!(" ({country})"));
    }
    out
}

/// WMO weather interpretation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "ConditionRepr")]
pub struct WeatherCondition(pub u8);

#[derive(Serialize)]
struct ConditionRepr {
    code: u8,
    description: &'static str,
}

impl From<WeatherCondition> for ConditionRepr {
    fn from(value: WeatherCondition) -> Self {
        Self { code: value.0, description: value.description() }
    }
}

impl WeatherCondition {
    pub fn code(&self) -> u8 {
        self.0
    }

    pub fn description(&self) -> &'static str {
        match self.0 {
            0 => "Clear sky",
            1 => "Mainly clear",
            2 => "Partly cloudy",
            3 => "Overcast",
            45 | 48 => "Foggy",
            51 | 53 | 55 => "Drizzle",
            56 | 57 => "Freezing drizzle",
            61 | 63 | 65 => "Rain",
            66 | 67 => "Freezing rain",
            71 | 73 | 75 => "Snow",
            77 => "Snow grains",
            80..=82 => "Rain showers",
            85 | 86 => "Snow showers",
            95 => "Thunderstorm",
            96 | 99 => "Thunderstorm with hail",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Unit labels exactly as the provider reported them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedUnits {
    pub temperature: String,
    pub wind_speed: String,
    pub pressure: String,
    pub precipitation: String,
}

/// Current conditions for one location. Every field is populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherRecord {
    pub observed_at: DateTime<Utc>,
    pub utc_offset_seconds: i32,
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub condition: WeatherCondition,
    pub wind_speed: f64,
    pub humidity_pct: u8,
    pub pressure: f64,
    pub precipitation: f64,
    pub units: ReportedUnits,
}

impl WeatherRecord {
    /// Observation time in the location's own UTC offset.
    pub fn local_observed_at(&self) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(self.utc_offset_seconds).unwrap_or_else(|| Utc.fix());
        self.observed_at.with_timezone(&offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub const fn all() -> &'static [TemperatureUnit] {
        &[TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(format!("unknown temperature unit '{s}', expected celsius or fahrenheit")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindSpeedUnit {
    #[default]
    Kmh,
    Ms,
    Mph,
    Kn,
}

impl WindSpeedUnit {
    pub const fn all() -> &'static [WindSpeedUnit] {
        &[WindSpeedUnit::Kmh, WindSpeedUnit::Ms, WindSpeedUnit::Mph, WindSpeedUnit::Kn]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WindSpeedUnit::Kmh => "kmh",
            WindSpeedUnit::Ms => "ms",
            WindSpeedUnit::Mph => "mph",
            WindSpeedUnit::Kn => "kn",
        }
    }
}

impl fmt::Display for WindSpeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindSpeedUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kmh" => Ok(WindSpeedUnit::Kmh),
            "ms" => Ok(WindSpeedUnit::Ms),
            "mph" => Ok(WindSpeedUnit::Mph),
            "kn" => Ok(WindSpeedUnit::Kn),
            _ => Err(format!("unknown wind speed unit '{s}', expected kmh, ms, mph or kn")),
        }
    }
}

/// Units requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Units {
    pub temperature: TemperatureUnit,
    pub wind_speed: WindSpeedUnit,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn berlin() -> GeoMatch {
        GeoMatch {
            name: "Berlin".into(),
            latitude: 52.52,
            longitude: 13.41,
            country: Some("Germany".into()),
            country_code: Some("DE".into()),
            admin1: Some("Land Berlin".into()),
            timezone: Some("Europe/Berlin".into()),
        }
    }

    #[test]
    fn display_name_includes_region_and_country() {
        let loc = Location::from_match("berlin", berlin());
        assert_eq!(loc.display_name(), "Berlin, Land Berlin (Germany)");
        assert_eq!(loc.query(), "berlin");
    }

    #[test]
    fn display_name_skips_region_equal_to_name() {
        let mut m = berlin();
        m.admin1 = Some("Berlin".into());
        assert_eq!(m.label(), "Berlin (Germany)");
    }

    #[test]
    fn coordinates_location_uses_formatted_coordinates() {
        let loc = Location::from_coordinates("52.52,13.41", 52.52, 13.41);
        assert_eq!(loc.display_name(), "52.5200, 13.4100");
        assert_eq!(loc.country(), None);
    }

    #[test]
    fn condition_descriptions() {
        assert_eq!(WeatherCondition(0).description(), "Clear sky");
        assert_eq!(WeatherCondition(81).description(), "Rain showers");
        assert_eq!(WeatherCondition(99).description(), "Thunderstorm with hail");
        assert_eq!(WeatherCondition(42).description(), "Unknown");
    }

    #[test]
    fn unit_parsing() {
        assert_eq!("Fahrenheit".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Fahrenheit));
        assert_eq!("kn".parse::<WindSpeedUnit>(), Ok(WindSpeedUnit::Kn));
        assert!("kelvin".parse::<TemperatureUnit>().is_err());
        for unit in WindSpeedUnit::all() {
            assert_eq!(unit.as_str().parse::<WindSpeedUnit>(), Ok(*unit));
        }
    }

    #[test]
    fn local_time_applies_offset() {
        let record = WeatherRecord {
            observed_at: DateTime::from_timestamp(1_714_564_800, 0).unwrap(),
            utc_offset_seconds: 7200,
            temperature: 21.4,
            apparent_temperature: 20.9,
            condition: WeatherCondition(2),
            wind_speed: 12.3,
            humidity_pct: 55,
            pressure: 1013.2,
            precipitation: 0.0,
            units: ReportedUnits {
                temperature: "°C".into(),
                wind_speed: "km/h".into(),
                pressure: "hPa".into(),
                precipitation: "mm".into(),
            },
        };
        assert_eq!(record.local_observed_at().format("%H:%M").to_string(), "14:00");
    }
}
