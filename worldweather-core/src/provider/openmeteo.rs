use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::{
    error::{Result, UpstreamStatus, WeatherError},
    forecast,
    model::{ConditionCode, CurrentConditions, DailyForecast, ForecastSample, Location, Units},
    request::OpenMeteoQuery,
};

use super::{ProviderId, WeatherProvider, http_client, truncate_body};

const PROVIDER: ProviderId = ProviderId::OpenMeteo;

const CURRENT_FIELDS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "weather_code",
    "wind_speed_10m",
    "wind_direction_10m",
];

const DAILY_FIELDS: &[&str] = &[
    "weather_code",
    "temperature_2m_max",
    "temperature_2m_min",
    "sunrise",
    "sunset",
    "precipitation_probability_max",
];

/// Keyless client for `api.open-meteo.com`.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Url::parse(base_url).map_err(|e| {
            WeatherError::Configuration(format!("Invalid Open-Meteo base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            base_url: base_url.to_string(),
            http: http_client(timeout)?,
        })
    }

    async fn get(&self, query: &OpenMeteoQuery<'_>) -> Result<OmResponse> {
        let url = query.build(&self.base_url)?;
        debug!(url = %url, "Requesting Open-Meteo");

        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| WeatherError::transport(PROVIDER, &e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| WeatherError::transport(PROVIDER, &e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<OmError>(&body)
                .map(|e| e.reason)
                .unwrap_or_else(|_| truncate_body(&body));
            return Err(WeatherError::upstream(
                PROVIDER,
                UpstreamStatus::Http(status.as_u16()),
                message,
            ));
        }

        let parsed: OmResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::malformed(PROVIDER, &e))?;

        if parsed.latitude.is_none() || parsed.longitude.is_none() {
            warn!("Open-Meteo response is missing latitude/longitude");
            return Err(WeatherError::upstream(
                PROVIDER,
                UpstreamStatus::Rejected("missing coordinates".to_string()),
                "Invalid weather data received from API",
            ));
        }

        Ok(parsed)
    }
}

/// Open-Meteo has no Kelvin output; standard requests are served in metric.
fn effective_units(units: Units) -> Units {
    if units == Units::Standard {
        warn!("Open-Meteo does not support standard units, using metric");
        Units::Metric
    } else {
        units
    }
}

#[derive(Debug, Deserialize)]
struct OmError {
    reason: String,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    utc_offset_seconds: i32,
    current: Option<OmCurrent>,
    daily: Option<OmDaily>,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    time: String,
    temperature_2m: f64,
    relative_humidity_2m: f64,
    apparent_temperature: f64,
    weather_code: i32,
    wind_speed_10m: f64,
    #[serde(default)]
    wind_direction_10m: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<String>,
    weather_code: Vec<i32>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    #[serde(default)]
    sunrise: Vec<String>,
    #[serde(default)]
    sunset: Vec<String>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
}

impl OmResponse {
    fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_seconds).ok_or_else(|| {
            malformed(format!("utc_offset_seconds out of range: {}", self.utc_offset_seconds))
        })
    }

    fn current_conditions(&self, location: &Location, units: Units) -> Result<CurrentConditions> {
        let offset = self.offset()?;
        let current = self
            .current
            .as_ref()
            .ok_or_else(|| malformed("No current weather data in response"))?;

        let today = self.daily.as_ref();
        let sunrise = today
            .and_then(|d| d.sunrise.first())
            .map(|s| parse_local(s, offset))
            .transpose()?;
        let sunset = today
            .and_then(|d| d.sunset.first())
            .map(|s| parse_local(s, offset))
            .transpose()?;

        Ok(CurrentConditions {
            provider: PROVIDER,
            location_name: location.name.clone(),
            units,
            observed_at: parse_local(&current.time, offset)?,
            temperature: current.temperature_2m,
            feels_like: current.apparent_temperature,
            humidity_pct: current.relative_humidity_2m.round().clamp(0.0, 100.0) as u8,
            wind_speed: current.wind_speed_10m,
            wind_direction_deg: current.wind_direction_10m.map(|d| d.round() as u16 % 360),
            condition: ConditionCode::Wmo(current.weather_code),
            condition_group: None,
            summary: None,
            pressure_hpa: None,
            visibility_m: None,
            sunrise,
            sunset,
            today_high: today.and_then(|d| d.temperature_2m_max.first().copied()),
            today_low: today.and_then(|d| d.temperature_2m_min.first().copied()),
        })
    }

    fn daily_series(&self) -> Result<Vec<ForecastSample>> {
        let offset = self.offset()?;
        let daily = self
            .daily
            .as_ref()
            .ok_or_else(|| malformed("No daily forecast data in response"))?;

        let days = daily.time.len();
        if daily.weather_code.len() != days
            || daily.temperature_2m_max.len() != days
            || daily.temperature_2m_min.len() != days
        {
            return Err(malformed("Daily arrays have mismatched lengths"));
        }

        daily
            .time
            .iter()
            .enumerate()
            .map(|(i, day)| {
                Ok(ForecastSample {
                    timestamp: parse_day(day, offset)?,
                    temperature: None,
                    temperature_max: daily.temperature_2m_max[i],
                    temperature_min: daily.temperature_2m_min[i],
                    condition: ConditionCode::Wmo(daily.weather_code[i]),
                    precipitation_probability: daily
                        .precipitation_probability_max
                        .get(i)
                        .copied()
                        .flatten()
                        .map(|pct| pct / 100.0),
                })
            })
            .collect()
    }
}

fn malformed(message: impl Into<String>) -> WeatherError {
    WeatherError::upstream(PROVIDER, UpstreamStatus::MalformedBody, message)
}

/// Open-Meteo reports local wall-clock times like `2024-01-15T12:00`.
fn parse_local(s: &str, offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| malformed(format!("Invalid datetime '{s}': {e}")))?;
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| malformed(format!("Ambiguous local time '{s}'")))
}

fn parse_day(s: &str, offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| malformed(format!("Invalid date '{s}': {e}")))?;
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    offset
        .from_local_datetime(&midnight)
        .single()
        .ok_or_else(|| malformed(format!("Ambiguous local date '{s}'")))
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        PROVIDER
    }

    #[instrument(skip(self, location), fields(lat = %location.latitude, lon = %location.longitude))]
    async fn fetch_current(&self, location: &Location, units: Units) -> Result<CurrentConditions> {
        let units = effective_units(units);
        let query = OpenMeteoQuery {
            latitude: location.latitude,
            longitude: location.longitude,
            timezone: &location.timezone,
            current: CURRENT_FIELDS,
            daily: DAILY_FIELDS,
            units,
            ..Default::default()
        };

        self.get(&query).await?.current_conditions(location, units)
    }

    #[instrument(skip(self, location), fields(lat = %location.latitude, lon = %location.longitude))]
    async fn fetch_forecast(
        &self,
        location: &Location,
        units: Units,
    ) -> Result<Vec<ForecastSample>> {
        let query = OpenMeteoQuery {
            latitude: location.latitude,
            longitude: location.longitude,
            timezone: &location.timezone,
            daily: DAILY_FIELDS,
            units: effective_units(units),
            ..Default::default()
        };

        self.get(&query).await?.daily_series()
    }

    /// Open-Meteo already aggregates per day; today is shown by the current conditions.
    fn condense(&self, series: &[ForecastSample]) -> DailyForecast {
        forecast::skip_today(series)
    }
}
