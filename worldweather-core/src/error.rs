use std::fmt;

use thiserror::Error;

use crate::provider::ProviderId;

/// What went wrong on the provider's side of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamStatus {
    /// Non-2xx HTTP status.
    Http(u16),
    /// 2xx response carrying a provider failure marker (e.g. OpenWeather `cod`).
    Rejected(String),
    /// The request never produced a response.
    Transport,
    /// The body could not be decoded into the expected shape.
    MalformedBody,
}

impl fmt::Display for UpstreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamStatus::Http(code) => write!(f, "HTTP {code}"),
            UpstreamStatus::Rejected(marker) => write!(f, "rejected ({marker})"),
            UpstreamStatus::Transport => f.write_str("transport failure"),
            UpstreamStatus::MalformedBody => f.write_str("malformed body"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WeatherError {
    /// A required setting (usually an API key) is missing or unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{provider} request failed: {status}: {message}")]
    Upstream {
        provider: ProviderId,
        status: UpstreamStatus,
        message: String,
    },

    #[error("No location found for \"{query}\"")]
    NotFound { query: String },

    #[error(
        "Invalid coordinates ({latitude}, {longitude}): latitude must be -90 to 90, longitude must be -180 to 180"
    )]
    InvalidLocation { latitude: f64, longitude: f64 },
}

impl WeatherError {
    pub(crate) fn upstream(
        provider: ProviderId,
        status: UpstreamStatus,
        message: impl Into<String>,
    ) -> Self {
        WeatherError::Upstream { provider, status, message: message.into() }
    }

    pub(crate) fn transport(provider: ProviderId, err: &reqwest::Error) -> Self {
        Self::upstream(provider, UpstreamStatus::Transport, err.to_string())
    }

    pub(crate) fn malformed(provider: ProviderId, err: &serde_json::Error) -> Self {
        Self::upstream(provider, UpstreamStatus::MalformedBody, err.to_string())
    }

    /// True for failures where re-issuing the same lookup may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            WeatherError::Upstream { status, .. } => match status {
                UpstreamStatus::Http(code) => *code >= 500 || *code == 429,
                UpstreamStatus::Transport => true,
                UpstreamStatus::Rejected(_) | UpstreamStatus::MalformedBody => false,
            },
            WeatherError::Configuration(_)
            | WeatherError::NotFound { .. }
            | WeatherError::InvalidLocation { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, WeatherError>;
