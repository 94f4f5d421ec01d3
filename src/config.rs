//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::streams::{SelectionPolicy, StreamCatalog, StreamDescriptor};

/// Coordinates entered by hand instead of an IP lookup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl ManualLocation {
    /// Parse "latitude, longitude" as typed in the settings window
    pub fn parse(input: &str) -> Option<Self> {
        let (lat, lon) = input.split_once(',')?;
        let latitude: f64 = lat.trim().parse().ok()?;
        let longitude: f64 = lon.trim().parse().ok()?;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        Some(Self { latitude, longitude })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    #[serde(default)]
    pub player_volume: f32,
    #[serde(default = "default_true")]
    pub autoplay: bool,
    #[serde(default)]
    pub selection_policy: SelectionPolicy,
    // Custom channel list; empty means the built-in news channels
    #[serde(default)]
    pub streams: Vec<StreamDescriptor>,
    // Location
    #[serde(default)]
    pub manual_location: Option<ManualLocation>,
    #[serde(default = "default_geolocation_url")]
    pub geolocation_url: String,
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    // Collaborators
    #[serde(default = "default_weather_url")]
    pub weather_url: String,
    #[serde(default = "default_news_feed_url")]
    pub news_feed_url: String,
    #[serde(default = "default_headline_refresh")]
    pub headline_refresh_secs: u64,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    // Translation
    #[serde(default)]
    pub translate_headlines: bool,
    #[serde(default)]
    pub translation_api_key: String,
    #[serde(default = "default_translation_model")]
    pub translation_model: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_true() -> bool { true }
fn default_geolocation_url() -> String { "http://ip-api.com/json/".to_string() }
fn default_geocoding_url() -> String { "https://nominatim.openstreetmap.org/reverse".to_string() }
fn default_weather_url() -> String { "https://api.open-meteo.com/v1/forecast".to_string() }
fn default_news_feed_url() -> String {
    "https://news.google.com/rss?hl=en-{country}&gl={country}&ceid={country}:en".to_string()
}
fn default_headline_refresh() -> u64 { 180 } // 3 minutes
fn default_fetch_timeout() -> u64 { 10 }
fn default_translation_model() -> String { "gemini-3-flash-preview".to_string() }
fn default_user_agent() -> String { format!("teevo/{}", env!("CARGO_PKG_VERSION")) }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dark_mode: true,
            player_volume: 0.0,
            autoplay: true,
            selection_policy: SelectionPolicy::Nearest,
            streams: Vec::new(),
            manual_location: None,
            geolocation_url: default_geolocation_url(),
            geocoding_url: default_geocoding_url(),
            weather_url: default_weather_url(),
            news_feed_url: default_news_feed_url(),
            headline_refresh_secs: default_headline_refresh(),
            fetch_timeout_secs: default_fetch_timeout(),
            translate_headlines: false,
            translation_api_key: String::new(),
            translation_model: default_translation_model(),
            user_agent: default_user_agent(),
        }
    }
}

impl AppConfig {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("teevo");
        fs::create_dir_all(&path).ok();
        path.push("config.json");
        path
    }

    /// Load from the user config directory, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self) {
        let path = Self::config_path();
        if let Err(e) = self.save_to(&path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to save config");
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Channel catalog: the configured list when valid, built-in otherwise
    pub fn catalog(&self) -> StreamCatalog {
        if self.streams.is_empty() {
            return StreamCatalog::default_news();
        }
        match StreamCatalog::new(self.streams.clone()) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(error = %e, "invalid custom stream list, using built-in channels");
                StreamCatalog::default_news()
            }
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn headline_refresh(&self) -> Duration {
        Duration::from_secs(self.headline_refresh_secs.max(1))
    }

    /// API key for headline translation. Environment wins over the file.
    pub fn translation_key(&self) -> Option<String> {
        ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .chain(std::iter::once(self.translation_api_key.clone()))
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
    }
}
