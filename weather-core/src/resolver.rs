//! Turns free-text input into a [`Location`].
//!
//! Coordinates (`"52.52, 13.41"`) resolve locally. Postal codes and names go
//! through the provider's geocoding search. A name may carry a qualifier after
//! the first comma (`"Paris, France"`), which narrows the candidates by country,
//! country code or region.

use std::sync::Arc;
use tracing::debug;

use crate::{GeoMatch, Location, WeatherError, WeatherProvider};

/// Maximum number of autocomplete candidates.
pub const SUGGESTION_LIMIT: usize = 10;
/// Prefixes shorter than this never trigger a suggestion lookup.
pub const MIN_SUGGEST_CHARS: usize = 3;

const MAX_NAME_CHARS: usize = 100;
const QUALIFIED_SEARCH_LIMIT: usize = 10;

/// Classified user input.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Coordinates { latitude: f64, longitude: f64 },
    PostalCode(String),
    Name { name: String, qualifier: Option<String> },
}

impl LocationQuery {
    pub fn parse(input: &str) -> Result<Self, WeatherError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(WeatherError::invalid_location(input, "location must not be empty"));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(WeatherError::invalid_location(input, "location contains control characters"));
        }
        if trimmed.chars().count() > MAX_NAME_CHARS {
            return Err(WeatherError::invalid_location(
                input,
                format!("location is longer than {MAX_NAME_CHARS} characters"),
            ));
        }

        if let Some((latitude, longitude)) = parse_coordinates(trimmed) {
            if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
                return Err(WeatherError::invalid_location(
                    input,
                    "latitude must be between -90 and 90",
                ));
            }
            if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
                return Err(WeatherError::invalid_location(
                    input,
                    "longitude must be between -180 and 180",
                ));
            }
            return Ok(Self::Coordinates { latitude, longitude });
        }

        if is_postal_code(trimmed) {
            return Ok(Self::PostalCode(trimmed.to_string()));
        }

        let (name, qualifier) = match trimmed.split_once(',') {
            Some((name, rest)) => {
                let rest = rest.trim();
                (name.trim(), (!rest.is_empty()).then(|| rest.to_string()))
            }
            None => (trimmed, None),
        };
        if name.is_empty() {
            return Err(WeatherError::invalid_location(input, "place name is missing"));
        }

        Ok(Self::Name { name: name.to_string(), qualifier })
    }
}

fn parse_coordinates(s: &str) -> Option<(f64, f64)> {
    let (lat, lon) = s.split_once(',')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lon = lon.trim().parse::<f64>().ok()?;
    Some((lat, lon))
}

/// Digits with at most one inner dash or space, e.g. `10115`, `12345-6789`, `114 55`.
fn is_postal_code(s: &str) -> bool {
    let digits = s.chars().filter(char::is_ascii_digit).count();
    let separators: Vec<(usize, char)> =
        s.char_indices().filter(|(_, c)| !c.is_ascii_digit()).collect();

    if !(3..=10).contains(&digits) {
        return false;
    }
    match separators.as_slice() {
        [] => true,
        [(idx, c)] => (*c == '-' || *c == ' ') && *idx > 0 && *idx < s.len() - 1,
        _ => false,
    }
}

fn matches_qualifier(candidate: &GeoMatch, qualifier: &str) -> bool {
    let qualifier = qualifier.to_lowercase();
    [&candidate.country, &candidate.country_code, &candidate.admin1]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase() == qualifier)
}

/// Resolves user input through a [`WeatherProvider`]'s geocoding search.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    provider: Arc<dyn WeatherProvider>,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Resolve `input` into a fully populated [`Location`].
    ///
    /// Fails with [`WeatherError::InvalidLocation`] when the input cannot be
    /// parsed or no place matches it. Geocoding transport failures keep their
    /// own kind.
    pub async fn resolve(&self, input: &str) -> Result<Location, WeatherError> {
        let query = LocationQuery::parse(input)?;
        debug!(input, ?query, "resolving location");

        let location = match query {
            LocationQuery::Coordinates { latitude, longitude } => {
                Location::from_coordinates(input.trim(), latitude, longitude)
            }
            LocationQuery::PostalCode(code) => {
                let found = self.first_match(&code, 1, |_| true).await?;
                Location::from_match(input.trim(), found.ok_or_else(|| not_found(input))?)
            }
            LocationQuery::Name { name, qualifier: None } => {
                let found = self.first_match(&name, 1, |_| true).await?;
                Location::from_match(input.trim(), found.ok_or_else(|| not_found(input))?)
            }
            LocationQuery::Name { name, qualifier: Some(qualifier) } => {
                let found = self
                    .first_match(&name, QUALIFIED_SEARCH_LIMIT, |m| matches_qualifier(m, &qualifier))
                    .await?;
                Location::from_match(input.trim(), found.ok_or_else(|| not_found(input))?)
            }
        };

        debug!(
            "resolved '{}' to {} at ({:.4}, {:.4})",
            input,
            location.display_name(),
            location.latitude(),
            location.longitude()
        );
        Ok(location)
    }

    /// Autocomplete candidates for a partially typed name.
    pub async fn suggest(&self, prefix: &str) -> Result<Vec<GeoMatch>, WeatherError> {
        let prefix = prefix.trim();
        if prefix.chars().count() < MIN_SUGGEST_CHARS {
            return Ok(Vec::new());
        }
        let mut matches = self.provider.search(prefix, SUGGESTION_LIMIT).await?;
        matches.retain(|m| !m.name.trim().is_empty());
        Ok(matches)
    }

    async fn first_match(
        &self,
        name: &str,
        limit: usize,
        accept: impl Fn(&GeoMatch) -> bool,
    ) -> Result<Option<GeoMatch>, WeatherError> {
        let candidates = self.provider.search(name, limit).await?;
        Ok(candidates.into_iter().find(|m| !m.name.trim().is_empty() && accept(m)))
    }
}

fn not_found(input: &str) -> WeatherError {
    WeatherError::invalid_location(input.trim(), "not found, try a different city name")
}
