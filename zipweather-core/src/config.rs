use anyhow::{Context, Result, anyhow, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    cache::DEFAULT_FRESHNESS_WINDOW_SECS,
    provider::openweather::DEFAULT_BASE_URL,
    rate_limit::{DEFAULT_MAX_PULLS_PER_MINUTE, DEFAULT_TRACKING_WINDOW_SECS},
};

/// Provider connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// When absent the key is read from `OPENWEATHERMAP_API_KEY` on first use.
    pub api_key: Option<String>,
    pub base_url: String,
    /// Passed through as the `units` query parameter when set.
    pub units: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            units: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub freshness_window_secs: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: DEFAULT_FRESHNESS_WINDOW_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_pulls_per_minute: usize,
    pub tracking_window_secs: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_pulls_per_minute: DEFAULT_MAX_PULLS_PER_MINUTE,
            tracking_window_secs: DEFAULT_TRACKING_WINDOW_SECS,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [provider]
/// api_key = "..."
///
/// [cache]
/// freshness_window_secs = 1740
///
/// [rate_limit]
/// max_pulls_per_minute = 20
/// tracking_window_secs = 61
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "zipweather", "zipweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.rate_limit.max_pulls_per_minute > 0,
            "rate_limit.max_pulls_per_minute must be greater than zero"
        );
        ensure!(
            self.rate_limit.tracking_window_secs > 0,
            "rate_limit.tracking_window_secs must be greater than zero"
        );
        ensure!(
            self.cache.freshness_window_secs >= 0,
            "cache.freshness_window_secs must not be negative"
        );
        Ok(())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.provider.api_key = Some(api_key);
    }

    pub fn api_key(&self) -> Option<&str> {
        self.provider.api_key.as_deref()
    }
}
