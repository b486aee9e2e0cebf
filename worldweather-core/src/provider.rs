use crate::{
    Config, CurrentConditions, DailyForecast, ForecastSample, Location, Units, WeatherReport,
    error::{Result, WeatherError},
    provider::{openmeteo::OpenMeteoProvider, openweather::OpenWeatherProvider},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt::Debug};

pub mod openmeteo;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenMeteo,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "openmeteo",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenMeteo, ProviderId::OpenWeather]
    }

    /// Whether calls to this provider need an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openmeteo" | "open-meteo" => Ok(ProviderId::OpenMeteo),
            "openweather" | "openweathermap" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openmeteo, openweather."
            )),
        }
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Conditions right now at `location`. One HTTP request.
    async fn fetch_current(&self, location: &Location, units: Units) -> Result<CurrentConditions>;

    /// The provider's forecast series, as delivered. One HTTP request.
    async fn fetch_forecast(
        &self,
        location: &Location,
        units: Units,
    ) -> Result<Vec<ForecastSample>>;

    /// Reduce a series from [`fetch_forecast`](Self::fetch_forecast) to a daily outlook.
    fn condense(&self, series: &[ForecastSample]) -> DailyForecast;

    /// Current conditions and daily outlook, fetched concurrently. Fails if either fails.
    async fn fetch_report(&self, location: &Location, units: Units) -> Result<WeatherReport> {
        let (current, series) = tokio::try_join!(
            self.fetch_current(location, units),
            self.fetch_forecast(location, units),
        )?;

        Ok(WeatherReport {
            location: location.clone(),
            current,
            daily: self.condense(&series),
        })
    }
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(id: ProviderId, config: &Config) -> Result<Box<dyn WeatherProvider>> {
    let timeout = config.timeout();

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenMeteo => {
            Box::new(OpenMeteoProvider::new(config.base_url(id), timeout)?)
        }
        ProviderId::OpenWeather => {
            let api_key = config.resolved_api_key(id).ok_or_else(|| {
                WeatherError::Configuration(format!(
                    "No API key configured for provider '{id}'.\n\
                     Hint: set OPENWEATHER_API_KEY or run `worldweather configure {id}`."
                ))
            })?;
            Box::new(
                OpenWeatherProvider::new(api_key, config.base_url(id), timeout)?
                    .with_language(config.language()),
            )
        }
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>> {
    provider_from_config(config.default_provider_id()?, config)
}

pub(crate) fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| WeatherError::Configuration(format!("Failed to build HTTP client: {e}")))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
