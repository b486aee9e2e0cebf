use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::conditions::ConditionDisplay;
use crate::error::{Result, WeatherError};
use crate::provider::ProviderId;

/// A named point on the globe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// IANA zone id, or `auto` to let the provider derive it from coordinates.
    pub timezone: String,
}

impl Location {
    pub fn new(
        name: impl Into<String>,
        country: impl Into<String>,
        latitude: f64,
        longitude: f64,
        timezone: impl Into<String>,
    ) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherError::InvalidLocation { latitude, longitude });
        }

        Ok(Self {
            name: name.into(),
            country: country.into(),
            state: None,
            latitude,
            longitude,
            timezone: timezone.into(),
        })
    }

    pub fn with_state(mut self, state: Option<String>) -> Self {
        self.state = state;
        self
    }

    /// `"35.68°, 139.65°"`
    pub fn coordinates_label(&self) -> String {
        format!(
            "{}°, {}°",
            format_coordinate(self.latitude),
            format_coordinate(self.longitude)
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for part in [self.state.as_deref(), Some(self.country.as_str())].into_iter().flatten() {
            if !part.is_empty() {
                write!(f, ", {part}")?;
            }
        }
        Ok(())
    }
}

/// Coordinates are always shown with two decimals, ties rounded away from zero.
pub fn format_coordinate(value: f64) -> String {
    format!("{:.2}", (value * 100.0).round() / 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Kelvin, m/s.
    Standard,
    /// Celsius; m/s on OpenWeather, km/h on Open-Meteo.
    #[default]
    Metric,
    /// Fahrenheit, mph.
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Standard => "K",
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "standard" => Ok(Units::Standard),
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown units '{value}'. Supported units: standard, metric, imperial."
            )),
        }
    }
}

/// Provider-specific weather classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionCode {
    /// OpenWeather icon code such as `"10d"`.
    Icon(String),
    /// WMO weather interpretation code used by Open-Meteo.
    Wmo(i32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub provider: ProviderId,
    pub location_name: String,
    pub units: Units,
    pub observed_at: DateTime<FixedOffset>,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    pub wind_direction_deg: Option<u16>,
    pub condition: ConditionCode,
    /// OpenWeather condition group (`Rain`, `Clouds`, ...), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_group: Option<String>,
    /// Free-text description supplied by the provider, if any.
    pub summary: Option<String>,
    pub pressure_hpa: Option<f64>,
    pub visibility_m: Option<f64>,
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
    pub today_high: Option<f64>,
    pub today_low: Option<f64>,
}

impl CurrentConditions {
    pub fn wind_speed_unit(&self) -> &'static str {
        wind_speed_unit(self.provider, self.units)
    }

    pub fn condition_display(&self) -> ConditionDisplay {
        self.condition.describe_with_group(self.condition_group.as_deref())
    }
}

pub fn wind_speed_unit(provider: ProviderId, units: Units) -> &'static str {
    match (provider, units) {
        (_, Units::Imperial) => "mph",
        (ProviderId::OpenMeteo, _) => "km/h",
        (ProviderId::OpenWeather, _) => "m/s",
    }
}

/// One time-stamped snapshot of a forecast series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    /// Local time at the forecast location.
    pub timestamp: DateTime<FixedOffset>,
    /// Instantaneous temperature, for point-in-time series.
    pub temperature: Option<f64>,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub condition: ConditionCode,
    /// Probability of precipitation in `0.0..=1.0`.
    pub precipitation_probability: Option<f64>,
}

/// At most one sample per calendar day, ascending.
pub type DailyForecast = Vec<ForecastSample>;

/// Everything needed to render one location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: Location,
    pub current: CurrentConditions,
    pub daily: DailyForecast,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_rejects_out_of_range_coordinates() {
        assert!(Location::new("North Pole", "Arctic", 90.0, 0.0, "UTC").is_ok());
        assert!(Location::new("Edge", "Nowhere", 0.0, -180.0, "UTC").is_ok());

        let err = Location::new("Nowhere", "Nowhere", 90.5, 0.0, "UTC").unwrap_err();
        assert!(matches!(err, WeatherError::InvalidLocation { .. }));
        assert!(Location::new("Nowhere", "Nowhere", 0.0, 181.0, "UTC").is_err());
    }

    #[test]
    fn coordinates_are_rounded_to_two_decimals() {
        assert_eq!(format_coordinate(35.6762), "35.68");
        assert_eq!(format_coordinate(-0.1278), "-0.13");
        assert_eq!(format_coordinate(52.52), "52.52");
        assert_eq!(format_coordinate(0.125), "0.13");
        assert_eq!(format_coordinate(1.125), "1.13");
        assert_eq!(format_coordinate(10.625), "10.63");
        assert_eq!(format_coordinate(-1.125), "-1.13");

        let tokyo = Location::new("Tokyo", "Japan", 35.6762, 139.6503, "Asia/Tokyo")
            .expect("valid coordinates");
        assert_eq!(tokyo.coordinates_label(), "35.68°, 139.65°");
    }

    #[test]
    fn location_display_includes_state_when_present() {
        let loc = Location::new("Portland", "US", 45.52, -122.68, "auto")
            .expect("valid coordinates")
            .with_state(Some("Oregon".into()));
        assert_eq!(loc.to_string(), "Portland, Oregon, US");

        let bare = Location::new("48.85, 2.35", "", 48.85, 2.35, "auto").expect("valid");
        assert_eq!(bare.to_string(), "48.85, 2.35");
    }

    #[test]
    fn units_parse_case_insensitively() {
        assert_eq!(Units::try_from("Imperial").expect("known units"), Units::Imperial);
        assert_eq!(Units::default(), Units::Metric);
        assert!(Units::try_from("furlongs").is_err());
    }

    #[test]
    fn wind_unit_depends_on_provider() {
        assert_eq!(wind_speed_unit(ProviderId::OpenMeteo, Units::Metric), "km/h");
        assert_eq!(wind_speed_unit(ProviderId::OpenWeather, Units::Metric), "m/s");
        assert_eq!(wind_speed_unit(ProviderId::OpenWeather, Units::Imperial), "mph");
    }
}
