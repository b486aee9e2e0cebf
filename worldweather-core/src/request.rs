//! Query construction for the provider endpoints.
//!
//! Builders only append optional parameters that were actually supplied, so a
//! built URL never carries empty `units=` or `daily=` pairs.

use reqwest::Url;

use crate::error::{Result, WeatherError};
use crate::model::Units;

pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com/v1";
pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const GEOCODING_BASE_URL: &str = "https://api.openweathermap.org/geo/1.0";

fn endpoint(base_url: &str, path: &str) -> Result<Url> {
    let raw = format!("{}/{}", base_url.trim_end_matches('/'), path);
    Url::parse(&raw)
        .map_err(|e| WeatherError::Configuration(format!("Invalid base URL '{base_url}': {e}")))
}

fn require_key(api_key: Option<&str>) -> Result<&str> {
    match api_key.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(WeatherError::Configuration(
            "No OpenWeather API key configured. Set OPENWEATHER_API_KEY or run `worldweather configure openweather`."
                .to_string(),
        )),
    }
}

/// `GET {base}/forecast` on Open-Meteo.
#[derive(Debug, Clone, Default)]
pub struct OpenMeteoQuery<'a> {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: &'a str,
    pub current: &'a [&'a str],
    pub hourly: &'a [&'a str],
    pub daily: &'a [&'a str],
    pub units: Units,
}

impl OpenMeteoQuery<'_> {
    pub fn build(&self, base_url: &str) -> Result<Url> {
        let mut url = endpoint(base_url, "forecast")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("latitude", &self.latitude.to_string())
                .append_pair("longitude", &self.longitude.to_string())
                .append_pair("timezone", self.timezone);

            for (name, fields) in [
                ("current", self.current),
                ("hourly", self.hourly),
                ("daily", self.daily),
            ] {
                if !fields.is_empty() {
                    pairs.append_pair(name, &fields.join(","));
                }
            }

            // Open-Meteo defaults to Celsius and km/h and has no Kelvin option.
            if self.units == Units::Imperial {
                pairs
                    .append_pair("temperature_unit", "fahrenheit")
                    .append_pair("wind_speed_unit", "mph");
            }
        }
        Ok(url)
    }
}

/// `GET {base}/weather` and `GET {base}/forecast` on OpenWeather.
#[derive(Debug, Clone, Default)]
pub struct OpenWeatherQuery<'a> {
    pub latitude: f64,
    pub longitude: f64,
    pub api_key: Option<&'a str>,
    pub units: Option<Units>,
    pub lang: Option<&'a str>,
}

impl OpenWeatherQuery<'_> {
    pub fn build(&self, base_url: &str, path: &str) -> Result<Url> {
        let api_key = require_key(self.api_key)?;
        let mut url = endpoint(base_url, path)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("lat", &self.latitude.to_string())
                .append_pair("lon", &self.longitude.to_string())
                .append_pair("appid", api_key);

            if let Some(units) = self.units {
                pairs.append_pair("units", units.as_str());
            }
            if let Some(lang) = self.lang.filter(|l| !l.is_empty()) {
                pairs.append_pair("lang", lang);
            }
        }
        Ok(url)
    }
}

/// `GET {base}/direct` on the OpenWeather geocoding API.
#[derive(Debug, Clone, Default)]
pub struct GeocodingQuery<'a> {
    pub query: &'a str,
    pub api_key: Option<&'a str>,
    pub limit: Option<u8>,
}

impl GeocodingQuery<'_> {
    pub fn build(&self, base_url: &str) -> Result<Url> {
        let api_key = require_key(self.api_key)?;
        let mut url = endpoint(base_url, "direct")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", self.query).append_pair("appid", api_key);
            if let Some(limit) = self.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        Ok(url)
    }
}

/// URL safe for logs: the `appid` value is replaced.
pub fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "appid" { "[REDACTED]".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}
