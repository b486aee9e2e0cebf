use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode, Select};
use tracing::debug;
use worldweather_core::{
    Config, Geocoder, Location, Lookup, ProviderId, Units, WeatherService,
    geocoding::AUTO_TIMEZONE, locations, model::format_coordinate, provider,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "worldweather",
    version,
    about = "Current weather and a short outlook for cities worldwide"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials and defaults for a specific provider.
    Configure {
        /// Provider short name, "openmeteo" or "openweather".
        provider: String,
    },

    /// Show weather for a city, coordinates, or a random catalog city.
    Show {
        /// City name. Catalog cities are used directly, anything else is geocoded.
        city: Option<String>,

        /// Provider to use instead of the configured default.
        #[arg(long)]
        provider: Option<String>,

        /// "standard", "metric" or "imperial".
        #[arg(long)]
        units: Option<String>,

        #[arg(long, allow_hyphen_values = true, requires = "lon", conflicts_with = "city")]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,

        /// IANA zone for `--lat/--lon`; defaults to provider auto-detection.
        #[arg(long, requires = "lat")]
        timezone: Option<String>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the built-in city catalog.
    Locations,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show { city, provider, units, lat, lon, timezone, json } => {
                let config = Config::load()?;
                let service = build_service(&config, provider.as_deref(), units.as_deref())?;
                let lookup = lookup_for(city, lat.zip(lon), timezone)?;
                show(&service, lookup, json).await
            }
            Command::Locations => {
                print!("{}", render::catalog(locations::CATALOG));
                Ok(())
            }
        }
    }
}

fn build_service(
    config: &Config,
    provider: Option<&str>,
    units: Option<&str>,
) -> anyhow::Result<WeatherService> {
    let mut service = match provider {
        Some(name) => {
            let id = ProviderId::try_from(name)?;
            WeatherService::new(
                provider::provider_from_config(id, config)?,
                Geocoder::from_config(config)?,
                config.units,
            )
        }
        None => WeatherService::from_config(config)?,
    };

    if let Some(units) = units {
        service = service.with_units(Units::try_from(units)?);
    }

    Ok(service)
}

fn lookup_for(
    city: Option<String>,
    coordinates: Option<(f64, f64)>,
    timezone: Option<String>,
) -> anyhow::Result<Lookup> {
    if let Some((latitude, longitude)) = coordinates {
        let timezone = timezone.unwrap_or_else(|| AUTO_TIMEZONE.to_string());
        let label = format!("{}, {}", format_coordinate(latitude), format_coordinate(longitude));
        let location = Location::new(label, "", latitude, longitude, timezone)?;
        return Ok(Lookup::Coordinates(location));
    }

    Ok(match city {
        None => Lookup::Random,
        Some(name) if locations::find(&name).is_ok() => Lookup::Catalog(name),
        Some(name) => Lookup::City(name),
    })
}

async fn show(service: &WeatherService, lookup: Lookup, json: bool) -> anyhow::Result<()> {
    // A retry must hit the same city, so pin the random pick first.
    let lookup = match lookup {
        Lookup::Random => Lookup::Coordinates(service.locate(&Lookup::Random).await?),
        other => other,
    };
    debug!(
        ?lookup,
        provider = %service.provider().id(),
        units = %service.units(),
        "Resolved lookup"
    );

    loop {
        match service.fetch(&lookup).await {
            Ok(report) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", render::report(&report)?);
                }
                return Ok(());
            }
            Err(err) => {
                eprintln!("Weather data unavailable: {err}");

                if json {
                    return Err(err.into());
                }

                let again = Confirm::new("Try again?")
                    .with_default(err.is_retryable())
                    .prompt()
                    .unwrap_or(false);
                if !again {
                    return Err(err.into());
                }
            }
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if id.requires_api_key() {
        let api_key = Password::new(&format!("API key for {id}:"))
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .with_help_message("Stored in the config file. OPENWEATHER_API_KEY overrides it.")
            .prompt()
            .context("Failed to read API key")?;

        let api_key = api_key.trim().to_string();
        anyhow::ensure!(!api_key.is_empty(), "API key must not be empty");
        config.upsert_provider_api_key(id, api_key);
    } else {
        config.providers.entry(id.as_str().to_string()).or_default();
        println!("{id} needs no API key.");
    }

    let make_default = Confirm::new(&format!("Use {id} by default?"))
        .with_default(config.default_provider_id().ok() == Some(id))
        .prompt()
        .context("Failed to read default provider choice")?;
    if make_default {
        config.set_default_provider(id);
    }

    let options = vec![Units::Metric, Units::Imperial, Units::Standard];
    let start = options.iter().position(|u| *u == config.units).unwrap_or(0);
    config.units = Select::new("Units:", options)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read units")?;

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}
