//! Location resolution plus provider calls, as one retryable operation.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};

use crate::{
    config::Config,
    error::Result,
    geocoding::Geocoder,
    locations,
    model::{Location, Units, WeatherReport},
    provider::{self, WeatherProvider},
};

/// Where to get weather for.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// A random city from the built-in catalog.
    Random,
    /// A catalog city by name.
    Catalog(String),
    /// Free-text search through the geocoding API.
    City(String),
    Coordinates(Location),
}

/// Result of a [`WeatherService::search`].
#[derive(Debug)]
pub enum Outcome {
    Fresh(Box<WeatherReport>),
    /// A newer search started before this one finished; its result was dropped.
    Superseded,
}

#[derive(Debug)]
pub struct WeatherService {
    provider: Box<dyn WeatherProvider>,
    geocoder: Geocoder,
    units: Units,
    latest: AtomicU64,
}

impl WeatherService {
    pub fn new(provider: Box<dyn WeatherProvider>, geocoder: Geocoder, units: Units) -> Self {
        Self { provider, geocoder, units, latest: AtomicU64::new(0) }
    }

    /// Default provider, geocoder and units from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            provider::default_provider_from_config(config)?,
            Geocoder::from_config(config)?,
            config.units,
        ))
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn provider(&self) -> &dyn WeatherProvider {
        self.provider.as_ref()
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub async fn locate(&self, lookup: &Lookup) -> Result<Location> {
        match lookup {
            Lookup::Random => Ok(locations::random_location()),
            Lookup::Catalog(name) => locations::find(name),
            Lookup::City(query) => self.geocoder.resolve(query).await,
            Lookup::Coordinates(location) => Ok(location.clone()),
        }
    }

    /// Resolve `lookup` and fetch its report. Holds no state between calls,
    /// so calling it again with the same lookup is a retry.
    pub async fn fetch(&self, lookup: &Lookup) -> Result<WeatherReport> {
        let location = self.locate(lookup).await?;
        info!(location = %location, provider = %self.provider.id(), "Fetching weather");

        self.provider.fetch_report(&location, self.units).await
    }

    /// Like [`fetch`](Self::fetch), but a search that was overtaken by a later
    /// one reports [`Outcome::Superseded`] instead of its (stale) result.
    pub async fn search(&self, lookup: &Lookup) -> Result<Outcome> {
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.fetch(lookup).await;

        if self.latest.load(Ordering::SeqCst) != token {
            debug!(token, "Discarding superseded search");
            return Ok(Outcome::Superseded);
        }

        result.map(|report| Outcome::Fresh(Box::new(report)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::openmeteo::OpenMeteoProvider;
    use crate::request::{GEOCODING_BASE_URL, OPEN_METEO_BASE_URL};
    use crate::WeatherError;
    use std::time::Duration;

    fn service() -> WeatherService {
        let timeout = Duration::from_secs(5);
        WeatherService::new(
            Box::new(OpenMeteoProvider::new(OPEN_METEO_BASE_URL, timeout).expect("valid url")),
            Geocoder::new(None, GEOCODING_BASE_URL, timeout).expect("valid url"),
            Units::Metric,
        )
    }

    #[tokio::test]
    async fn locate_catalog_and_coordinates_without_network() {
        let svc = service();

        let paris = svc.locate(&Lookup::Catalog("paris".into())).await.expect("catalog city");
        assert_eq!(paris.timezone, "Europe/Paris");

        let here = Location::new("Here", "Somewhere", 10.0, 20.0, "UTC").expect("valid");
        let same = svc.locate(&Lookup::Coordinates(here.clone())).await.expect("passthrough");
        assert_eq!(same, here);

        let random = svc.locate(&Lookup::Random).await.expect("catalog pick");
        assert!(locations::CATALOG.iter().any(|e| e.name == random.name));
    }

    #[tokio::test]
    async fn unknown_catalog_name_is_not_found() {
        let err = service().fetch(&Lookup::Catalog("Atlantis".into())).await.unwrap_err();
        assert!(matches!(err, WeatherError::NotFound { .. }));
    }

    #[tokio::test]
    async fn city_lookup_without_key_is_configuration_error() {
        let err = service().fetch(&Lookup::City("London".into())).await.unwrap_err();
        assert!(matches!(err, WeatherError::Configuration(_)));
    }

    #[test]
    fn with_units_overrides_default() {
        assert_eq!(service().with_units(Units::Imperial).units(), Units::Imperial);
    }
}
