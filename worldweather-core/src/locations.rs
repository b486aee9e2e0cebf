//! Built-in catalog of well-known cities.

use rand::Rng;

use crate::error::{Result, WeatherError};
use crate::model::Location;

#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub country: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: &'static str,
}

impl CatalogEntry {
    pub fn to_location(&self) -> Location {
        Location {
            name: self.name.to_string(),
            country: self.country.to_string(),
            state: None,
            latitude: self.latitude,
            longitude: self.longitude,
            timezone: self.timezone.to_string(),
        }
    }
}

const fn entry(
    name: &'static str,
    country: &'static str,
    latitude: f64,
    longitude: f64,
    timezone: &'static str,
) -> CatalogEntry {
    CatalogEntry { name, country, latitude, longitude, timezone }
}

pub static CATALOG: &[CatalogEntry] = &[
    entry("Tokyo", "Japan", 35.6762, 139.6503, "Asia/Tokyo"),
    entry("New York", "United States", 40.7128, -74.0060, "America/New_York"),
    entry("London", "United Kingdom", 51.5074, -0.1278, "Europe/London"),
    entry("Paris", "France", 48.8566, 2.3522, "Europe/Paris"),
    entry("Sydney", "Australia", -33.8688, 151.2093, "Australia/Sydney"),
    entry("Berlin", "Germany", 52.5200, 13.4050, "Europe/Berlin"),
    entry("Singapore", "Singapore", 1.3521, 103.8198, "Asia/Singapore"),
    entry("Dubai", "United Arab Emirates", 25.2048, 55.2708, "Asia/Dubai"),
    entry("São Paulo", "Brazil", -23.5505, -46.6333, "America/Sao_Paulo"),
    entry("Mumbai", "India", 19.0760, 72.8777, "Asia/Kolkata"),
    entry("Beijing", "China", 39.9042, 116.4074, "Asia/Shanghai"),
    entry("Los Angeles", "United States", 34.0522, -118.2437, "America/Los_Angeles"),
    entry("Cairo", "Egypt", 30.0444, 31.2357, "Africa/Cairo"),
    entry("Moscow", "Russia", 55.7558, 37.6173, "Europe/Moscow"),
    entry("Vancouver", "Canada", 49.2827, -123.1207, "America/Vancouver"),
];

/// Uniformly random pick from [`CATALOG`].
pub fn random_location() -> Location {
    let index = rand::rng().random_range(0..CATALOG.len());
    CATALOG[index].to_location()
}

/// Case-insensitive lookup by city name.
pub fn find(name: &str) -> Result<Location> {
    let needle = name.trim().to_lowercase();
    CATALOG
        .iter()
        .find(|e| e.name.to_lowercase() == needle)
        .map(CatalogEntry::to_location)
        .ok_or_else(|| WeatherError::NotFound { query: name.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_coordinates_are_in_range() {
        for e in CATALOG {
            assert!((-90.0..=90.0).contains(&e.latitude), "{}", e.name);
            assert!((-180.0..=180.0).contains(&e.longitude), "{}", e.name);
            assert!(!e.timezone.is_empty());
        }
    }

    #[test]
    fn random_location_comes_from_catalog() {
        for _ in 0..50 {
            let loc = random_location();
            assert!(CATALOG.iter().any(|e| e.name == loc.name));
        }
    }

    #[test]
    fn find_ignores_case_and_whitespace() {
        let loc = find("  new york ").expect("catalog city");
        assert_eq!(loc.timezone, "America/New_York");

        let loc = find("SÃO PAULO".to_lowercase().as_str()).expect("non-ascii name");
        assert_eq!(loc.country, "Brazil");
    }

    #[test]
    fn find_unknown_city_is_not_found() {
        let err = find("Atlantis").unwrap_err();
        assert!(matches!(err, WeatherError::NotFound { query } if query == "Atlantis"));
    }
}
