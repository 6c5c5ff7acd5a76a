use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{date::TimestampZone, error::ConfigError};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/3.0";

/// Connection settings for the OpenWeather One Call API.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OpenWeatherConfig {
    /// Example TOML:
    /// [open_weather]
    /// api_key = "..."
    pub api_key: Option<String>,

    /// Override for the API root, without the `/onecall/timemachine` suffix.
    pub base_url: Option<String>,

    /// Request timeout; reqwest's default applies when unset.
    pub timeout_secs: Option<u64>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Zone used to turn a logical date into the `dt` sent upstream.
    pub timezone: TimestampZone,

    /// Upper bound on city tasks running at once within a single date.
    pub max_active_tasks: usize,

    pub open_weather: OpenWeatherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: TimestampZone::default(),
            max_active_tasks: crate::city::CITIES.len(),
            open_weather: OpenWeatherConfig::default(),
        }
    }
}

impl Config {
    /// Load config from the platform location, or defaults on first run.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load config from `path`, or return defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;

        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write(parent.to_path_buf(), e))?;
        }

        let toml = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        fs::write(path, toml).map_err(|e| ConfigError::Write(path.to_path_buf(), e))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("dev", "weather-scraper", "weather-scraper")
            .ok_or(ConfigError::DirResolution)?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn base_url(&self) -> &str {
        self.open_weather.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Returns the stored API key, if present and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.open_weather.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.open_weather.api_key = Some(api_key);
    }
}
