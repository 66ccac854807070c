//! Configuration management for usermanager.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "usermanager";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "documents.db";

/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "users";

/// Allowed collection names.
const COLLECTION_NAME_PATTERN: &str = r"^[A-Za-z0-9_-]{1,64}$";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `USERMANAGER_`)
/// 2. TOML config file at `~/.config/usermanager/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document store configuration.
    pub store: StoreConfig,
    /// Record list controller configuration.
    pub controller: ControllerConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Which document store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local collection; contents are lost on exit.
    Memory,
    /// File-backed collection.
    #[default]
    Sqlite,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Document store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend holding the documents.
    pub backend: StoreBackend,
    /// Path to the database file (sqlite backend).
    /// Defaults to `~/.local/share/usermanager/documents.db`
    pub database_path: Option<PathBuf>,
    /// Name of the collection the records live in.
    pub collection: String,
    /// Simulated latency per call in milliseconds (memory backend).
    pub latency_ms: u64,
}

/// Record list controller configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Refuse an action while another one is still outstanding.
    pub single_flight: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Mask email addresses and phone numbers in diagnostic logs.
    pub redact_personal_data: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            database_path: None, // Resolved at runtime
            collection: DEFAULT_COLLECTION.to_string(),
            latency_ms: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            redact_personal_data: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("USERMANAGER_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let pattern = Regex::new(COLLECTION_NAME_PATTERN)
            .map_err(|e| Error::internal(format!("collection name pattern: {e}")))?;
        if !pattern.is_match(&self.store.collection) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "invalid collection name '{}': use 1-64 letters, digits, '_' or '-'",
                    self.store.collection
                ),
            });
        }

        if let Some(path) = &self.store.database_path {
            if path.as_os_str().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "database_path must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.store
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the simulated store latency as a Duration.
    #[must_use]
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.store.latency_ms)
    }
}
