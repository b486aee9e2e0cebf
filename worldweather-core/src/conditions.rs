//! Static lookup tables turning provider condition codes into text and glyphs.
//!
//! OpenWeather classifies conditions with icon codes (`"01d"`, `"10n"`),
//! Open-Meteo with numeric WMO codes. The vocabularies do not overlap, so each
//! provider has its own table. Lookups never fail: anything unmapped resolves
//! to [`UNKNOWN_DESCRIPTION`] and [`UNKNOWN_GLYPH`].

use serde::Serialize;

use crate::model::ConditionCode;

/// A looked-up condition. `code` is always the code that was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionDisplay {
    pub code: ConditionCode,
    pub description: &'static str,
    pub glyph: &'static str,
}

pub const UNKNOWN_DESCRIPTION: &str = "Unknown weather";
pub const UNKNOWN_GLYPH: &str = "❓";

/// Glyph for an OpenWeather group name nobody recognizes.
pub const DEFAULT_GROUP_GLYPH: &str = "🌤️";

impl ConditionDisplay {
    fn unknown(code: ConditionCode) -> Self {
        Self { code, description: UNKNOWN_DESCRIPTION, glyph: UNKNOWN_GLYPH }
    }

    pub fn is_unknown(&self) -> bool {
        self.description == UNKNOWN_DESCRIPTION
    }
}

static ICON_TABLE: &[(&str, &str, &str)] = &[
    ("01d", "Clear sky (day)", "☀️"),
    ("01n", "Clear sky (night)", "🌙"),
    ("02d", "Few clouds (day)", "🌤️"),
    ("02n", "Few clouds (night)", "☁️"),
    ("03d", "Scattered clouds", "⛅"),
    ("03n", "Scattered clouds", "⛅"),
    ("04d", "Broken clouds", "☁️"),
    ("04n", "Broken clouds", "☁️"),
    ("09d", "Shower rain", "🌦️"),
    ("09n", "Shower rain", "🌧️"),
    ("10d", "Rain (day)", "🌧️"),
    ("10n", "Rain (night)", "🌧️"),
    ("11d", "Thunderstorm", "⛈️"),
    ("11n", "Thunderstorm", "⛈️"),
    ("13d", "Snow", "❄️"),
    ("13n", "Snow", "❄️"),
    ("50d", "Mist", "🌫️"),
    ("50n", "Mist", "🌫️"),
];

static WMO_TABLE: &[(i32, &str, &str)] = &[
    (0, "Clear sky", "☀️"),
    (1, "Mainly clear", "🌤️"),
    (2, "Partly cloudy", "⛅"),
    (3, "Overcast", "☁️"),
    (45, "Fog", "🌫️"),
    (48, "Depositing rime fog", "🌫️"),
    (51, "Light drizzle", "🌦️"),
    (53, "Moderate drizzle", "🌦️"),
    (55, "Dense drizzle", "🌧️"),
    (56, "Light freezing drizzle", "🌨️"),
    (57, "Dense freezing drizzle", "🌨️"),
    (61, "Slight rain", "🌦️"),
    (63, "Moderate rain", "🌧️"),
    (65, "Heavy rain", "🌧️"),
    (66, "Light freezing rain", "🌨️"),
    (67, "Heavy freezing rain", "🌨️"),
    (71, "Slight snow fall", "🌨️"),
    (73, "Moderate snow fall", "❄️"),
    (75, "Heavy snow fall", "❄️"),
    (77, "Snow grains", "❄️"),
    (80, "Slight rain showers", "🌦️"),
    (81, "Moderate rain showers", "🌧️"),
    (82, "Violent rain showers", "⛈️"),
    (85, "Slight snow showers", "🌨️"),
    (86, "Heavy snow showers", "❄️"),
    (95, "Thunderstorm", "⛈️"),
    (96, "Thunderstorm with slight hail", "⛈️"),
    (99, "Thunderstorm with heavy hail", "⛈️"),
];

/// OpenWeather icon code lookup.
pub fn describe_icon(code: &str) -> ConditionDisplay {
    let key = ConditionCode::Icon(code.to_string());
    match ICON_TABLE.iter().find(|(icon, _, _)| *icon == code) {
        Some(&(_, description, glyph)) => ConditionDisplay { code: key, description, glyph },
        None => ConditionDisplay::unknown(key),
    }
}

/// WMO code lookup (Open-Meteo).
pub fn describe_wmo(code: i32) -> ConditionDisplay {
    let key = ConditionCode::Wmo(code);
    match WMO_TABLE.iter().find(|(wmo, _, _)| *wmo == code) {
        Some(&(_, description, glyph)) => ConditionDisplay { code: key, description, glyph },
        None => ConditionDisplay::unknown(key),
    }
}

/// Glyph for an OpenWeather condition group (`weather[].main`), case-insensitive.
pub fn glyph_for_group(group: &str) -> &'static str {
    match group.to_lowercase().as_str() {
        "clear" => "☀️",
        "clouds" => "☁️",
        "rain" => "🌧️",
        "drizzle" => "🌦️",
        "thunderstorm" => "⛈️",
        "snow" => "❄️",
        "mist" | "fog" | "haze" => "🌫️",
        "smoke" => "💨",
        "dust" | "sand" => "🌪️",
        _ => DEFAULT_GROUP_GLYPH,
    }
}

impl ConditionCode {
    pub fn describe(&self) -> ConditionDisplay {
        match self {
            ConditionCode::Icon(icon) => describe_icon(icon),
            ConditionCode::Wmo(code) => describe_wmo(*code),
        }
    }

    /// Like [`describe`](Self::describe), but an unmapped icon code takes its
    /// glyph from the OpenWeather condition group when one is known.
    pub fn describe_with_group(&self, group: Option<&str>) -> ConditionDisplay {
        let mut display = self.describe();
        let group = group.filter(|g| !g.is_empty());
        if let (ConditionCode::Icon(_), Some(group), true) = (self, group, display.is_unknown()) {
            display.glyph = glyph_for_group(group);
        }
        display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_codes_resolve() {
        assert_eq!(describe_icon("01d").description, "Clear sky (day)");
        assert_eq!(describe_icon("01n").glyph, "🌙");
        assert_eq!(describe_icon("50n").description, "Mist");
        assert_eq!(describe_icon("10d").code, ConditionCode::Icon("10d".into()));
    }

    #[test]
    fn wmo_codes_resolve() {
        assert_eq!(describe_wmo(0).description, "Clear sky");
        assert_eq!(describe_wmo(3).glyph, "☁️");
        assert_eq!(describe_wmo(99).description, "Thunderstorm with heavy hail");
        assert_eq!(describe_wmo(45).code, ConditionCode::Wmo(45));
    }

    #[test]
    fn unmapped_codes_fall_back_to_unknown() {
        for icon in ["", "99x", "01D", "not an icon"] {
            let display = describe_icon(icon);
            assert!(display.is_unknown());
            assert_eq!(display.glyph, UNKNOWN_GLYPH);
            assert_eq!(display.code, ConditionCode::Icon(icon.to_string()));
        }
        for code in [-1, 4, 100, i32::MAX, i32::MIN] {
            let display = describe_wmo(code);
            assert!(display.is_unknown());
            assert_eq!(display.code, ConditionCode::Wmo(code));
        }
        assert_eq!(describe_wmo(4).description, "Unknown weather");
    }

    #[test]
    fn tables_are_not_shared_between_providers() {
        assert!(describe_icon("3").is_unknown());
        assert!(!describe_wmo(3).is_unknown());
    }

    #[test]
    fn condition_code_dispatches_to_matching_table() {
        assert_eq!(ConditionCode::Icon("10d".into()).describe().description, "Rain (day)");
        assert_eq!(ConditionCode::Wmo(45).describe().description, "Fog");
        assert!(ConditionCode::Wmo(1234).describe().is_unknown());
    }

    #[test]
    fn group_names_map_to_glyphs() {
        assert_eq!(glyph_for_group("Clear"), "☀️");
        assert_eq!(glyph_for_group("HAZE"), "🌫️");
        assert_eq!(glyph_for_group("Sand"), "🌪️");
        assert_eq!(glyph_for_group("Squall"), DEFAULT_GROUP_GLYPH);
    }

    #[test]
    fn group_glyph_only_replaces_unknown_icons() {
        let unmapped = ConditionCode::Icon("99x".into()).describe_with_group(Some("Smoke"));
        assert_eq!(unmapped.glyph, "💨");
        assert_eq!(unmapped.description, UNKNOWN_DESCRIPTION);
        assert_eq!(unmapped.code, ConditionCode::Icon("99x".into()));

        let mapped = ConditionCode::Icon("01d".into()).describe_with_group(Some("Rain"));
        assert_eq!(mapped.glyph, "☀️");

        let no_group = ConditionCode::Icon("99x".into()).describe_with_group(None);
        assert_eq!(no_group.glyph, UNKNOWN_GLYPH);

        let wmo = ConditionCode::Wmo(1234).describe_with_group(Some("Clear"));
        assert_eq!(wmo.glyph, UNKNOWN_GLYPH);
    }
}
