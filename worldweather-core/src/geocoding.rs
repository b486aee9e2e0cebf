//! City name lookup through the OpenWeather geocoding API.

use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    config::Config,
    error::{Result, UpstreamStatus, WeatherError},
    model::Location,
    provider::{ProviderId, http_client, openweather::error_for_status},
    request::{GeocodingQuery, redacted},
};

const PROVIDER: ProviderId = ProviderId::OpenWeather;

/// Matches returned by [`Geocoder::search`] when no limit is given.
pub const DEFAULT_SEARCH_LIMIT: u8 = 5;

/// Geocoded places carry no zone id; Open-Meteo resolves `auto` from the coordinates.
pub const AUTO_TIMEZONE: &str = "auto";

#[derive(Debug, Clone)]
pub struct Geocoder {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct GeoMatch {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
    #[serde(default)]
    state: Option<String>,
}

impl GeoMatch {
    fn into_location(self) -> Result<Location> {
        let location = Location::new(self.name, self.country, self.lat, self.lon, AUTO_TIMEZONE)
            .map_err(|e| {
                WeatherError::upstream(PROVIDER, UpstreamStatus::MalformedBody, e.to_string())
            })?;
        Ok(location.with_state(self.state))
    }
}

impl Geocoder {
    /// A missing key is only reported when a lookup is attempted.
    pub fn new(api_key: Option<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        Url::parse(base_url).map_err(|e| {
            WeatherError::Configuration(format!("Invalid geocoding base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            api_key,
            base_url: base_url.to_string(),
            http: http_client(timeout)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.resolved_api_key(PROVIDER),
            config.geocoding_base_url(),
            config.timeout(),
        )
    }

    /// Best match for `query`, as ranked by the provider.
    #[instrument(skip(self))]
    pub async fn resolve(&self, query: &str) -> Result<Location> {
        self.lookup(query, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NotFound { query: query.to_string() })
    }

    /// Up to `limit` candidate places for `query`.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: Option<u8>) -> Result<Vec<Location>> {
        self.lookup(query, limit.unwrap_or(DEFAULT_SEARCH_LIMIT)).await
    }

    async fn lookup(&self, query: &str, limit: u8) -> Result<Vec<Location>> {
        let query = query.trim();
        let url = GeocodingQuery {
            query,
            api_key: self.api_key.as_deref(),
            limit: Some(limit),
        }
        .build(&self.base_url)?;

        if query.is_empty() {
            return Err(WeatherError::NotFound { query: String::new() });
        }

        debug!(url = %redacted(&url), "Requesting OpenWeather geocoding");

        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| WeatherError::transport(PROVIDER, &e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| WeatherError::transport(PROVIDER, &e))?;

        if !status.is_success() {
            return Err(error_for_status(status, &body));
        }

        let matches: Vec<GeoMatch> =
            serde_json::from_str(&body).map_err(|e| WeatherError::malformed(PROVIDER, &e))?;

        debug!(count = matches.len(), "Geocoding matches");

        matches.into_iter().map(GeoMatch::into_location).collect()
    }
}
