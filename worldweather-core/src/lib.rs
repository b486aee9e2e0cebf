//! Core library for the `worldweather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Request construction and clients for Open-Meteo and OpenWeatherMap
//! - Normalized models (current conditions, daily outlooks, locations)
//! - Forecast sampling and condition code lookup
//!
//! It is used by `worldweather-cli`, but can also be reused by other binaries or services.

pub mod conditions;
pub mod config;
pub mod error;
pub mod forecast;
pub mod geocoding;
pub mod locations;
pub mod model;
pub mod provider;
pub mod request;
pub mod service;

pub use conditions::ConditionDisplay;
pub use config::{Config, ProviderConfig};
pub use error::{UpstreamStatus, WeatherError};
pub use geocoding::Geocoder;
pub use model::{
    ConditionCode, CurrentConditions, DailyForecast, ForecastSample, Location, Units,
    WeatherReport,
};
pub use provider::{ProviderId, WeatherProvider};
pub use service::{Lookup, Outcome, WeatherService};
