use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::{
    error::{Result, UpstreamStatus, WeatherError},
    forecast,
    model::{ConditionCode, CurrentConditions, DailyForecast, ForecastSample, Location, Units},
    request::{OpenWeatherQuery, redacted},
};

use super::{ProviderId, WeatherProvider, http_client, truncate_body};

const PROVIDER: ProviderId = ProviderId::OpenWeather;

/// Success marker embedded in OpenWeather bodies. The current-weather
/// endpoint reports `cod` as a number, the forecast endpoint as a string.
#[derive(Debug, Clone, Copy)]
enum Sentinel {
    Number(i64),
    Text(&'static str),
}

const CURRENT_OK: Sentinel = Sentinel::Number(200);
const FORECAST_OK: Sentinel = Sentinel::Text("200");

impl Sentinel {
    fn matches(self, cod: &Value) -> bool {
        match self {
            Sentinel::Number(n) => cod.as_i64() == Some(n),
            Sentinel::Text(s) => cod.as_str() == Some(s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    lang: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
        Url::parse(base_url).map_err(|e| {
            WeatherError::Configuration(format!("Invalid OpenWeather base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            api_key,
            base_url: base_url.to_string(),
            lang: "en".to_string(),
            http: http_client(timeout)?,
        })
    }

    pub fn with_language(mut self, lang: &str) -> Self {
        self.lang = lang.to_string();
        self
    }

    fn query(&self, location: &Location, units: Units) -> OpenWeatherQuery<'_> {
        OpenWeatherQuery {
            latitude: location.latitude,
            longitude: location.longitude,
            api_key: Some(&self.api_key),
            units: Some(units),
            lang: Some(&self.lang),
        }
    }

    async fn get_checked<T: DeserializeOwned>(&self, url: Url, sentinel: Sentinel) -> Result<T> {
        debug!(url = %redacted(&url), "Requesting OpenWeather");

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

        let envelope: OwEnvelope =
            serde_json::from_str(&body).map_err(|e| WeatherError::malformed(PROVIDER, &e))?;

        if !sentinel.matches(&envelope.cod) {
            let cod = match &envelope.cod {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            warn!(cod = %cod, "OpenWeather rejected the request");
            let message = envelope
                .message
                .as_str()
                .map_or_else(|| format!("Weather data error: {cod}"), str::to_string);
            return Err(WeatherError::upstream(PROVIDER, UpstreamStatus::Rejected(cod), message));
        }

        serde_json::from_str(&body).map_err(|e| WeatherError::malformed(PROVIDER, &e))
    }
}

/// Non-2xx response from any OpenWeather endpoint.
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> WeatherError {
    let message = serde_json::from_str::<OwEnvelope>(body)
        .ok()
        .and_then(|e| e.message.as_str().map(str::to_string))
        .unwrap_or_else(|| truncate_body(body));

    WeatherError::upstream(PROVIDER, UpstreamStatus::Http(status.as_u16()), message)
}

#[derive(Debug, Deserialize)]
struct OwEnvelope {
    #[serde(default)]
    cod: Value,
    #[serde(default)]
    message: Value,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    #[serde(default)]
    pressure: Option<f64>,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    #[serde(default)]
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    sunrise: Option<i64>,
    #[serde(default)]
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    dt: i64,
    #[serde(default)]
    timezone: i32,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    visibility: Option<f64>,
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

fn malformed(message: impl Into<String>) -> WeatherError {
    WeatherError::upstream(PROVIDER, UpstreamStatus::MalformedBody, message)
}

fn offset_from(seconds: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(seconds)
        .ok_or_else(|| malformed(format!("timezone offset out of range: {seconds}")))
}

fn local_time(ts: i64, offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    DateTime::from_timestamp(ts, 0)
        .map(|utc| utc.with_timezone(&offset))
        .ok_or_else(|| malformed(format!("timestamp out of range: {ts}")))
}

/// Icon of the primary condition; an empty list maps to an unknown code.
fn primary_icon(weather: &[OwWeather]) -> ConditionCode {
    ConditionCode::Icon(weather.first().map(|w| w.icon.clone()).unwrap_or_default())
}

impl OwCurrentResponse {
    fn into_conditions(self, location: &Location, units: Units) -> Result<CurrentConditions> {
        let offset = offset_from(self.timezone)?;

        let location_name = if self.name.is_empty() {
            location.name.clone()
        } else {
            self.name
        };

        Ok(CurrentConditions {
            provider: PROVIDER,
            location_name,
            units,
            observed_at: local_time(self.dt, offset)?,
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            humidity_pct: self.main.humidity.round().clamp(0.0, 100.0) as u8,
            wind_speed: self.wind.speed,
            wind_direction_deg: self.wind.deg.map(|d| d.round() as u16 % 360),
            condition: primary_icon(&self.weather),
            condition_group: self.weather.first().map(|w| w.main.clone()),
            summary: self.weather.first().map(|w| w.description.clone()),
            pressure_hpa: self.main.pressure,
            visibility_m: self.visibility,
            sunrise: self.sys.sunrise.map(|t| local_time(t, offset)).transpose()?,
            sunset: self.sys.sunset.map(|t| local_time(t, offset)).transpose()?,
            today_high: None,
            today_low: None,
        })
    }
}

impl OwForecastResponse {
    fn into_series(self) -> Result<Vec<ForecastSample>> {
        let offset = offset_from(self.city.timezone)?;

        self.list
            .into_iter()
            .map(|entry| {
                Ok(ForecastSample {
                    timestamp: local_time(entry.dt, offset)?,
                    temperature: Some(entry.main.temp),
                    temperature_max: entry.main.temp_max,
                    temperature_min: entry.main.temp_min,
                    condition: primary_icon(&entry.weather),
                    precipitation_probability: entry.pop,
                })
            })
            .collect()
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        PROVIDER
    }

    #[instrument(skip(self, location), fields(lat = %location.latitude, lon = %location.longitude))]
    async fn fetch_current(&self, location: &Location, units: Units) -> Result<CurrentConditions> {
        let url = self.query(location, units).build(&self.base_url, "weather")?;
        let parsed: OwCurrentResponse = self.get_checked(url, CURRENT_OK).await?;

        parsed.into_conditions(location, units)
    }

    #[instrument(skip(self, location), fields(lat = %location.latitude, lon = %location.longitude))]
    async fn fetch_forecast(
        &self,
        location: &Location,
        units: Units,
    ) -> Result<Vec<ForecastSample>> {
        let url = self.query(location, units).build(&self.base_url, "forecast")?;
        let parsed: OwForecastResponse = self.get_checked(url, FORECAST_OK).await?;

        parsed.into_series()
    }

    fn condense(&self, series: &[ForecastSample]) -> DailyForecast {
        forecast::sample_daily(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;

    fn london() -> Location {
        Location::new("London", "United Kingdom", 51.5074, -0.1278, "Europe/London")
            .expect("valid")
    }

    #[test]
    fn sentinels_distinguish_number_and_string() {
        assert!(CURRENT_OK.matches(&json!(200)));
        assert!(!CURRENT_OK.matches(&json!("200")));
        assert!(FORECAST_OK.matches(&json!("200")));
        assert!(!FORECAST_OK.matches(&json!(200)));
        assert!(!CURRENT_OK.matches(&Value::Null));
    }

    #[test]
    fn current_response_maps_to_conditions() {
        let body = json!({
            "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
            "main": {
                "temp": 14.2, "feels_like": 13.6, "temp_min": 12.0, "temp_max": 15.5,
                "pressure": 1012, "humidity": 81
            },
            "visibility": 10000,
            "wind": { "speed": 4.1, "deg": 250 },
            "dt": 1_718_366_400,
            "sys": { "country": "GB", "sunrise": 1_718_336_000, "sunset": 1_718_396_000 },
            "timezone": 3600,
            "name": "London",
            "cod": 200
        });
        let parsed: OwCurrentResponse = serde_json::from_value(body).expect("decodable");
        let current = parsed.into_conditions(&london(), Units::Metric).expect("valid");

        assert_eq!(current.condition, ConditionCode::Icon("10d".into()));
        assert_eq!(current.summary.as_deref(), Some("light rain"));
        assert_eq!(current.condition_group.as_deref(), Some("Rain"));
        assert_eq!(current.humidity_pct, 81);
        assert_eq!(current.pressure_hpa, Some(1012.0));
        assert_eq!(current.visibility_m, Some(10000.0));
        assert_eq!(current.observed_at.offset().local_minus_utc(), 3600);
        // 2024-06-14T12:00:00Z
        assert_eq!(current.observed_at.hour(), 13);
        assert!(current.sunrise.is_some());
    }

    #[test]
    fn unmapped_icon_takes_glyph_from_group() {
        let body = json!({
            "weather": [{ "id": 711, "main": "Smoke", "description": "smoke", "icon": "60d" }],
            "main": {
                "temp": 30.0, "feels_like": 31.0, "temp_min": 29.0, "temp_max": 32.0, "humidity": 40
            },
            "wind": { "speed": 1.0 },
            "dt": 1_718_366_400,
            "sys": {},
            "timezone": 0,
            "name": "Delhi",
            "cod": 200
        });
        let parsed: OwCurrentResponse = serde_json::from_value(body).expect("decodable");
        let current = parsed.into_conditions(&london(), Units::Metric).expect("valid");

        let display = current.condition_display();
        assert_eq!(display.code, ConditionCode::Icon("60d".into()));
        assert_eq!(display.description, "Unknown weather");
        assert_eq!(display.glyph, "💨");
    }

    #[test]
    fn forecast_entries_become_local_samples() {
        let body = json!({
            "cod": "200",
            "list": [
                {
                    "dt": 1_718_366_400,
                    "main": {
                        "temp": 20.0, "feels_like": 19.0, "temp_min": 18.0, "temp_max": 21.0,
                        "humidity": 50
                    },
                    "weather": [],
                    "pop": 0.35
                }
            ],
            "city": { "name": "Tokyo", "country": "JP", "timezone": 32400 }
        });
        let parsed: OwForecastResponse = serde_json::from_value(body).expect("decodable");
        let series = parsed.into_series().expect("valid");

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].timestamp.hour(), 21);
        assert_eq!(series[0].temperature, Some(20.0));
        assert_eq!(series[0].precipitation_probability, Some(0.35));
        assert_eq!(series[0].condition.describe().description, "Unknown weather");
    }

    #[test]
    fn error_for_status_prefers_provider_message() {
        let err = error_for_status(
            StatusCode::UNAUTHORIZED,
            r#"{"cod":401,"message":"Invalid API key."}"#,
        );
        match err {
            WeatherError::Upstream { provider, status, message } => {
                assert_eq!(provider, ProviderId::OpenWeather);
                assert_eq!(status, UpstreamStatus::Http(401));
                assert_eq!(message, "Invalid API key.");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = error_for_status(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(err.to_string().contains("<html>bad gateway</html>"));
    }
}
