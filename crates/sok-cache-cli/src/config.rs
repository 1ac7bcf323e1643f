//! Application configuration management.
//!
//! The configuration names the site origin, the current cache name and the
//! install manifest. It is stored at `~/.config/sok-cache/config.json`;
//! missing fields fall back to the built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use sok_cache_core::{CacheName, Manifest, ProxyOptions};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "sok-cache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the configured origin
pub const ORIGIN_ENV: &str = "SOK_CACHE_ORIGIN";

/// Origin used when neither the config file nor the environment sets one
const DEFAULT_ORIGIN: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub origin: String,
    pub cache_name: CacheName,
    pub manifest: Manifest,
    /// No timeout when unset
    pub request_timeout_secs: Option<u64>,
    pub fill_on_miss: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            cache_name: CacheName::default(),
            manifest: Manifest::default(),
            request_timeout_secs: None,
            fill_on_miss: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply an origin taken from the environment, if any
    pub fn with_origin_override(mut self, origin: Option<String>) -> Self {
        if let Some(origin) = origin.filter(|o| !o.trim().is_empty()) {
            info!(origin = %origin, "Origin overridden from {}", ORIGIN_ENV);
            self.origin = origin;
        }
        self
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Directory holding one subdirectory per cache store
    pub fn store_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join("stores"))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join("logs"))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn proxy_options(&self) -> ProxyOptions {
        ProxyOptions {
            fill_on_miss: self.fill_on_miss,
            ..ProxyOptions::default()
        }
    }
}
