use std::sync::Arc;

use anyhow::{Context, anyhow};
use chrono::{Local, Timelike};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Password, Text};
use skywatch_core::{
    Config, FixedLocationProvider, HomeLocation, Lifecycle, LocationResolver, OpenWeatherGeocoder,
    Permissions, Preferences, WeatherSync, client::openweather::DEFAULT_BASE_URL,
    client_from_config, lifecycle, location::validate_city_name,
};

use crate::{
    host::{LoggedAmbience, PresetPermissions, TerminalNotifier},
    report,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skywatch", version, about = "Current weather, hourly forecast and air quality")]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the API key, default city, home location and preferences.
    Configure,

    /// Show weather for a city, or for the home location when no city is given.
    Show {
        /// City name; falls back to the configured default city.
        city: Option<String>,

        /// Display temperatures in Fahrenheit.
        #[arg(long)]
        fahrenheit: bool,

        /// Do not deliver weather alerts.
        #[arg(long)]
        no_alerts: bool,

        /// Number of forecast entries to print.
        #[arg(long, default_value_t = 8)]
        hours: usize,
    },

    /// Resolve coordinates for a city, or the home location when no city is given.
    Locate {
        city: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                city,
                fahrenheit,
                no_alerts,
                hours,
            } => show(city, fahrenheit, no_alerts, hours).await,
            Command::Locate { city } => locate(city).await,
        }
    }
}

fn resolver_for(config: &Config, api_key: &str) -> LocationResolver {
    let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
    LocationResolver::new(
        Arc::new(FixedLocationProvider::new(config.home_fix())),
        Arc::new(OpenWeatherGeocoder::with_base_url(base_url, api_key.to_string())),
    )
}

fn pick_city(arg: Option<String>, config: &Config) -> anyhow::Result<Option<String>> {
    match arg.or_else(|| config.default_city.clone()) {
        Some(raw) => Ok(Some(validate_city_name(&raw)?.to_string())),
        None => Ok(None),
    }
}

async fn show(
    city: Option<String>,
    fahrenheit: bool,
    no_alerts: bool,
    hours: usize,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let api_key = config.resolved_api_key()?;
    let city = pick_city(city, &config)?;

    let mut preferences: Preferences = config.preferences.into();
    preferences.use_fahrenheit |= fahrenheit;

    let sync = WeatherSync::with_preferences(
        client_from_config(&config),
        Arc::new(TerminalNotifier),
        preferences,
    );
    let resolver = resolver_for(&config, &api_key);

    let gate = PresetPermissions {
        location: config.home.is_some(),
        notifications: !no_alerts,
    };
    let permissions = Permissions::resolve(&gate).await;

    let mut screen = Lifecycle::new(LoggedAmbience::default());
    screen.enter_foreground()?;

    match &city {
        Some(name) => {
            if !permissions.notifications {
                sync.set_notifications_enabled(false);
            }
            sync.refresh_for_city(name, &api_key, &resolver).await;
        }
        None => {
            lifecycle::startup(permissions, &sync, &resolver, &api_key)
                .await
                .ok_or_else(|| {
                    anyhow!(
                        "No location available.\n\
                         Hint: pass a city (`skywatch show London`) or set a home location with `skywatch configure`."
                    )
                })?;
        }
    }

    let state = sync.snapshot();
    if let Some(weather) = &state.weather {
        screen.set_theme(weather.theme());
    }

    print!("{}", report::render(&state, hours, Local::now().hour())?);

    screen.stop();
    Ok(())
}

async fn locate(city: Option<String>) -> anyhow::Result<()> {
    let config = Config::load()?;

    match city {
        Some(raw) => {
            let name = validate_city_name(&raw)?;
            let api_key = config.resolved_api_key()?;
            let resolver = resolver_for(&config, &api_key);
            match resolver.resolve_coordinates_from_city_name(name).await {
                Some(coords) => println!("{name}: {coords}"),
                None => println!("No coordinates found for {name}."),
            }
        }
        None => {
            let resolver = resolver_for(&config, "");
            match resolver.resolve_current_device_location().await {
                Some(coords) => println!("Home: {coords}"),
                None => println!("No home location configured."),
            }
        }
    }

    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }

    let mut city_prompt = Text::new("Default city:")
        .with_help_message("Used by `skywatch show` when no city is given; Esc to skip");
    if let Some(current) = config.default_city.as_deref() {
        city_prompt = city_prompt.with_default(current);
    }
    if let Some(city) = city_prompt.prompt_skippable().context("Failed to read default city")? {
        config.default_city = if city.trim().is_empty() {
            None
        } else {
            Some(validate_city_name(&city)?.to_string())
        };
    }

    if Confirm::new("Set a home location (stands in for GPS)?")
        .with_default(config.home.is_some())
        .prompt()
        .context("Failed to read answer")?
    {
        let latitude = CustomType::<f64>::new("Latitude:")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .prompt()
            .context("Failed to read longitude")?;
        config.home = Some(HomeLocation {
            latitude,
            longitude,
            accuracy_m: 0.0,
        });
    }

    config.preferences.use_fahrenheit = Confirm::new("Display temperatures in Fahrenheit?")
        .with_default(config.preferences.use_fahrenheit)
        .prompt()
        .context("Failed to read answer")?;
    config.preferences.notifications_enabled = Confirm::new("Enable weather alerts?")
        .with_default(config.preferences.notifications_enabled)
        .prompt()
        .context("Failed to read answer")?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
