use thiserror::Error;

/// Failures surfaced by the lookup pipeline: resolve, fetch, render.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The input could not be parsed or geocoded.
    #[error("invalid location '{input}': {reason}")]
    InvalidLocation { input: String, reason: String },

    /// Connectivity failure or timeout, after the single retry.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered, but with an error status or an unusable payload.
    #[error("weather provider error: {0}")]
    Provider(String),

    /// Writing the report failed.
    #[error("failed to render weather report: {0}")]
    Render(#[from] std::io::Error),
}

impl WeatherError {
    pub fn invalid_location(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLocation { input: input.into(), reason: reason.into() }
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    /// Map a transport-level reqwest failure onto the error kinds.
    pub(crate) fn from_transport(err: &reqwest::Error, what: &str) -> Self {
        if err.is_timeout() {
            Self::Network(format!("{what}: connection timed out, check your internet connection"))
        } else if err.is_connect() {
            Self::Network(format!("{what}: cannot connect to the weather service"))
        } else if err.is_decode() || err.is_body() {
            Self::Provider(format!("{what}: failed to read response body: {err}"))
        } else {
            Self::Network(format!("{what}: {err}"))
        }
    }

    pub fn is_invalid_location(&self) -> bool {
        matches!(self, Self::InvalidLocation { .. })
    }
}
