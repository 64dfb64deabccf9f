use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    location::Fix,
    model::{Coordinates, Preferences},
};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "SKYWATCH_API_KEY";

/// Fix used in place of a GPS receiver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomeLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy_m: f64,
}

impl HomeLocation {
    pub fn to_fix(self) -> Fix {
        Fix {
            coordinates: Coordinates::new(self.latitude, self.longitude),
            accuracy_m: self.accuracy_m,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesConfig {
    pub notifications_enabled: bool,
    pub use_fahrenheit: bool,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        let prefs = Preferences::default();
        Self {
            notifications_enabled: prefs.notifications_enabled,
            use_fahrenheit: prefs.use_fahrenheit,
        }
    }
}

impl From<PreferencesConfig> for Preferences {
    fn from(cfg: PreferencesConfig) -> Self {
        Preferences {
            notifications_enabled: cfg.notifications_enabled,
            use_fahrenheit: cfg.use_fahrenheit,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_city = "London"
///
/// [home]
/// latitude = 51.5074
/// longitude = -0.1278
///
/// [preferences]
/// use_fahrenheit = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Overrides the OpenWeather endpoint, e.g. for a local proxy.
    pub base_url: Option<String>,

    pub default_city: Option<String>,

    pub home: Option<HomeLocation>,

    pub preferences: PreferencesConfig,
}

impl Config {
    /// API key from the environment, falling back to the stored one.
    pub fn resolved_api_key(&self) -> Result<String> {
        self.api_key_with_env(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_with_env(&self, env_value: Option<String>) -> Result<String> {
        env_value
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone())
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: run `skywatch configure` or set {API_KEY_ENV}."
                )
            })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn home_fix(&self) -> Option<Fix> {
        self.home.map(HomeLocation::to_fix)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skywatch", "skywatch")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_errors_with_hint() {
        let cfg = Config::default();
        let err = cfg.api_key_with_env(None).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No OpenWeather API key configured"));
        assert!(msg.contains("Hint: run `skywatch configure`"));
    }

    #[test]
    fn env_key_overrides_stored_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("STORED".into());

        assert_eq!(cfg.api_key_with_env(None).expect("stored key"), "STORED");
        assert_eq!(
            cfg.api_key_with_env(Some("FROM_ENV".into())).expect("env key"),
            "FROM_ENV"
        );
        assert_eq!(cfg.api_key_with_env(Some("  ".into())).expect("blank env"), "STORED");
    }

    #[test]
    fn preferences_default_to_alerts_on_celsius() {
        let prefs: Preferences = Config::default().preferences.into();
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn parses_partial_toml() {
        let cfg: Config = toml::from_str(
            r#"
            default_city = "Lisbon"

            [home]
            latitude = 38.72
            longitude = -9.14

            [preferences]
            use_fahrenheit = true
            "#,
        )
        .expect("valid config");

        assert_eq!(cfg.default_city.as_deref(), Some("Lisbon"));
        assert!(cfg.api_key.is_none());
        assert!(cfg.preferences.use_fahrenheit);
        assert!(cfg.preferences.notifications_enabled);

        let fix = cfg.home_fix().expect("home fix");
        assert_eq!(fix.coordinates, Coordinates::new(38.72, -9.14));
        assert_eq!(fix.accuracy_m, 0.0);
    }

    #[test]
    fn save_and_load_round_trip_through_a_file() {
        let dir = std::env::temp_dir().join(format!("skywatch-config-{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.default_city = Some("Oslo".into());
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded, cfg);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_from_missing_file_is_default() {
        let path = std::env::temp_dir().join("skywatch-definitely-missing").join("config.toml");
        assert_eq!(Config::load_from(&path).expect("default"), Config::default());
    }
}
