//! Configuration loading for the client stores.
//!
//! Configuration is loaded from a TOML file. Every field has a default, so
//! an empty file (or no file) yields a working setup.

use buoy_core::{DEFAULT_COALESCING_WINDOW, DEFAULT_FRESHNESS_WINDOW};
use buoy_types::DataCategory;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration for the client stores.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// Cache window configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Station directory configuration.
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Local storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Cache window configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Data older than this is refetched (default: 1800 = 30 minutes).
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,
    /// Readings further apart than this start a new snapshot
    /// (default: 3600 = 1 hour).
    #[serde(default = "default_coalescing_window_secs")]
    pub coalescing_window_secs: u64,
}

/// Station directory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Categories fetched per refresh (default: wave, weather).
    #[serde(default = "default_categories")]
    pub categories: Vec<DataCategory>,
    /// Event channel capacity per store (default: 64).
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// Local storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Preferences file, relative to the data directory.
    #[serde(default = "default_preferences_file")]
    pub preferences_file: PathBuf,
    /// Pinned station file, relative to the data directory.
    #[serde(default = "default_pinned_file")]
    pub pinned_file: PathBuf,
}

// Default value functions
fn default_freshness_window_secs() -> u64 {
    DEFAULT_FRESHNESS_WINDOW.as_secs()
}

fn default_coalescing_window_secs() -> u64 {
    DEFAULT_COALESCING_WINDOW.as_secs()
}

fn default_categories() -> Vec<DataCategory> {
    DataCategory::ALL.to_vec()
}

fn default_event_capacity() -> usize {
    64
}

fn default_preferences_file() -> PathBuf {
    PathBuf::from("preferences.json")
}

fn default_pinned_file() -> PathBuf {
    PathBuf::from("pinned.json")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: default_freshness_window_secs(),
            coalescing_window_secs: default_coalescing_window_secs(),
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            preferences_file: default_preferences_file(),
            pinned_file: default_pinned_file(),
        }
    }
}

impl ClientConfig {
    /// Load and validate configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds
    /// invalid values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the stores cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.freshness_window_secs == 0 {
            return Err(ConfigError::Invalid("freshness_window_secs must be > 0".into()));
        }
        if self.cache.coalescing_window_secs == 0 {
            return Err(ConfigError::Invalid("coalescing_window_secs must be > 0".into()));
        }
        if self.directory.categories.is_empty() {
            return Err(ConfigError::Invalid("categories must not be empty".into()));
        }
        if self.directory.event_capacity == 0 {
            return Err(ConfigError::Invalid("event_capacity must be > 0".into()));
        }
        Ok(())
    }

    /// Freshness window.
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.cache.freshness_window_secs)
    }

    /// Coalescing window.
    pub fn coalescing_window(&self) -> Duration {
        Duration::from_secs(self.cache.coalescing_window_secs)
    }

    /// Categories fetched per refresh, without duplicates.
    pub fn categories(&self) -> Vec<DataCategory> {
        let mut categories = Vec::with_capacity(self.directory.categories.len());
        for category in &self.directory.categories {
            if !categories.contains(category) {
                categories.push(*category);
            }
        }
        categories
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
