//! Plain-text rendering of weather reports.

use std::fmt::{self, Write};

use chrono::{DateTime, FixedOffset};
use worldweather_core::{ForecastSample, Units, WeatherReport, locations::CatalogEntry};

/// Rounded temperature with its unit symbol, e.g. `21°C`.
pub fn temperature(value: f64, units: Units) -> String {
    format!("{}{}", value.round() as i64, units.temperature_symbol())
}

fn percent(probability: f64) -> String {
    format!("{}%", (probability * 100.0).round() as i64)
}

fn clock(at: &DateTime<FixedOffset>) -> String {
    at.format("%H:%M").to_string()
}

pub fn report(report: &WeatherReport) -> Result<String, fmt::Error> {
    let current = &report.current;
    let units = current.units;
    let condition = current.condition_display();
    let mut out = String::new();

    writeln!(out, "{}", report.location)?;
    writeln!(
        out,
        "{}  (local time {})",
        report.location.coordinates_label(),
        clock(&current.observed_at)
    )?;
    writeln!(out)?;

    writeln!(
        out,
        "{} {}",
        condition.glyph,
        current.summary.as_deref().unwrap_or(condition.description)
    )?;
    writeln!(
        out,
        "Temperature: {} (feels like {})",
        temperature(current.temperature, units),
        temperature(current.feels_like, units)
    )?;
    if let (Some(high), Some(low)) = (current.today_high, current.today_low) {
        writeln!(
            out,
            "High / Low:  {} / {}",
            temperature(high, units),
            temperature(low, units)
        )?;
    }
    writeln!(out, "Humidity:    {}%", current.humidity_pct)?;

    write!(out, "Wind:        {:.1} {}", current.wind_speed, current.wind_speed_unit())?;
    if let Some(deg) = current.wind_direction_deg {
        write!(out, " from {deg}°")?;
    }
    writeln!(out)?;

    if let Some(pressure) = current.pressure_hpa {
        writeln!(out, "Pressure:    {} hPa", pressure.round() as i64)?;
    }
    if let Some(visibility) = current.visibility_m {
        writeln!(out, "Visibility:  {:.1} km", visibility / 1000.0)?;
    }
    if let (Some(sunrise), Some(sunset)) = (current.sunrise, current.sunset) {
        writeln!(out, "Sunrise:     {}  Sunset: {}", clock(&sunrise), clock(&sunset))?;
    }

    if !report.daily.is_empty() {
        writeln!(out)?;
        writeln!(out, "Forecast:")?;
        for sample in &report.daily {
            writeln!(out, "  {}", forecast_line(sample, units))?;
        }
    }

    Ok(out)
}

/// `Sat  ☀️  22°C / 14°C  20% rain  Clear sky (day)`
pub fn forecast_line(sample: &ForecastSample, units: Units) -> String {
    let condition = sample.condition.describe();
    let rain = sample
        .precipitation_probability
        .map(|pop| format!("  {} rain", percent(pop)))
        .unwrap_or_default();

    format!(
        "{}  {}  {} / {}{}  {}",
        sample.timestamp.format("%a"),
        condition.glyph,
        temperature(sample.temperature_max, units),
        temperature(sample.temperature_min, units),
        rain,
        condition.description,
    )
}

pub fn catalog(entries: &[CatalogEntry]) -> String {
    let width = entries.iter().map(|e| e.name.chars().count()).max().unwrap_or(0);
    entries
        .iter()
        .map(|e| {
            let pad = width - e.name.chars().count();
            format!("{}{}  {}  ({})\n", e.name, " ".repeat(pad), e.country, e.timezone)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldweather_core::{ConditionCode, CurrentConditions, Location, ProviderId};

    fn report_fixture() -> WeatherReport {
        let at = |s: &str| DateTime::parse_from_rfc3339(s).expect("valid timestamp");

        WeatherReport {
            location: Location::new("Tokyo", "Japan", 35.6762, 139.6503, "Asia/Tokyo")
                .expect("valid"),
            current: CurrentConditions {
                provider: ProviderId::OpenWeather,
                location_name: "Tokyo".into(),
                units: Units::Metric,
                observed_at: at("2024-06-14T21:00:00+09:00"),
                temperature: 21.6,
                feels_like: 21.2,
                humidity_pct: 64,
                wind_speed: 3.64,
                wind_direction_deg: Some(240),
                condition: ConditionCode::Icon("01n".into()),
                condition_group: Some("Clear".into()),
                summary: None,
                pressure_hpa: Some(1012.0),
                visibility_m: Some(10000.0),
                sunrise: Some(at("2024-06-14T04:25:00+09:00")),
                sunset: Some(at("2024-06-14T18:58:00+09:00")),
                today_high: None,
                today_low: None,
            },
            daily: vec![ForecastSample {
                timestamp: at("2024-06-15T12:00:00+09:00"),
                temperature: Some(24.0),
                temperature_max: 25.4,
                temperature_min: 18.5,
                condition: ConditionCode::Icon("10d".into()),
                precipitation_probability: Some(0.35),
            }],
        }
    }

    #[test]
    fn temperatures_are_rounded_with_symbol() {
        assert_eq!(temperature(21.6, Units::Metric), "22°C");
        assert_eq!(temperature(-0.4, Units::Imperial), "0°F");
        assert_eq!(temperature(293.15, Units::Standard), "293K");
    }

    #[test]
    fn report_shows_current_block() {
        let text = report(&report_fixture()).expect("renders");

        assert!(text.starts_with("Tokyo, Japan\n35.68°, 139.65°  (local time 21:00)\n"));
        assert!(text.contains("🌙 Clear sky (night)"));
        assert!(text.contains("Temperature: 22°C (feels like 21°C)"));
        assert!(text.contains("Humidity:    64%"));
        assert!(text.contains("Wind:        3.6 m/s from 240°"));
        assert!(text.contains("Sunrise:     04:25  Sunset: 18:58"));
        assert!(!text.contains("High / Low"));
    }

    #[test]
    fn forecast_line_uses_local_weekday() {
        let fixture = report_fixture();
        let line = forecast_line(&fixture.daily[0], Units::Metric);
        assert_eq!(line, "Sat  🌧️  25°C / 19°C  35% rain  Rain (day)");
    }

    #[test]
    fn optional_fields_are_left_out() {
        let mut fixture = report_fixture();
        fixture.current.wind_direction_deg = None;
        fixture.current.sunset = None;
        fixture.daily[0].precipitation_probability = None;

        let text = report(&fixture).expect("renders");
        assert!(text.contains("Wind:        3.6 m/s\n"));
        assert!(!text.contains("Sunrise"));
        assert!(text.ends_with("  Sat  🌧️  25°C / 19°C  Rain (day)\n"));
    }

    #[test]
    fn catalog_is_aligned() {
        let listing = catalog(worldweather_core::locations::CATALOG);
        assert_eq!(listing.lines().count(), worldweather_core::locations::CATALOG.len());
        assert!(listing.lines().any(|l| l.starts_with("Tokyo ") && l.ends_with("(Asia/Tokyo)")));
    }
}
