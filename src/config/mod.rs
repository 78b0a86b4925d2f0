//! Configuration management.
//!
//! This module handles:
//! - Environment variable loading
//! - Configuration validation
//! - Default value handling
//!
//! # Example
//!
//! ```
//! use liftlog::config::{Config, DEFAULT_DATA_DIR};
//! use liftlog::selector::BackendKind;
//!
//! // Create a config directly (use Config::from_env() in production)
//! let config = Config {
//!     backend: BackendKind::EmbeddedStore,
//!     data_dir: DEFAULT_DATA_DIR.to_string(),
//!     log_level: "info".to_string(),
//!     color_attempts: 50,
//! };
//!
//! assert!(config.store_path().ends_with("liftlog.redb"));
//! ```

mod validation;

pub use validation::{validate_config, MAX_COLOR_ATTEMPTS, MIN_COLOR_ATTEMPTS};

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::selector::{BackendKind, PREFERENCE_FILE, STORE_FILE};

/// Default data directory.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default color retry bound.
pub const DEFAULT_COLOR_ATTEMPTS: u32 = crate::color::MAX_COLOR_ATTEMPTS;

/// Application configuration.
///
/// Use [`Config::from_env`] to load configuration from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend used when no preference has been saved.
    pub backend: BackendKind,
    /// Directory holding the embedded store and the backend preference.
    pub data_dir: String,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: String,
    /// How many colors to try before giving up.
    pub color_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            data_dir: DEFAULT_DATA_DIR.into(),
            log_level: DEFAULT_LOG_LEVEL.into(),
            color_attempts: DEFAULT_COLOR_ATTEMPTS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables (with defaults):
    /// - `LIFTLOG_BACKEND`: `embedded-store` or `relational` (default: `embedded-store`)
    /// - `LIFTLOG_DATA_DIR`: Data directory (default: `./data`)
    /// - `LOG_LEVEL`: Logging level (default: `info`)
    /// - `LIFTLOG_COLOR_ATTEMPTS`: Color retry bound (default: `50`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - `LIFTLOG_BACKEND` names an unknown backend
    /// - `LIFTLOG_COLOR_ATTEMPTS` is not a valid positive integer
    /// - Any value fails validation (see [`validate_config`])
    #[must_use = "configuration should be used"]
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let backend = match std::env::var("LIFTLOG_BACKEND") {
            Ok(value) => value.parse().map_err(|e| match e {
                ConfigError::InvalidValue { reason, .. } => ConfigError::InvalidValue {
                    var: "LIFTLOG_BACKEND".into(),
                    reason,
                },
                other => other,
            })?,
            Err(_) => BackendKind::default(),
        };

        let data_dir =
            std::env::var("LIFTLOG_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.into());

        let color_attempts = parse_env_u32("LIFTLOG_COLOR_ATTEMPTS", DEFAULT_COLOR_ATTEMPTS)?;

        let config = Self {
            backend,
            data_dir,
            log_level,
            color_attempts,
        };

        validate_config(&config)?;
        Ok(config)
    }

    /// Location of the embedded store file.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(STORE_FILE)
    }

    /// Location of the backend preference file.
    #[must_use]
    pub fn preference_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(PREFERENCE_FILE)
    }
}

/// Parse an environment variable as u32, using a default if not set.
fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        val.parse().map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a positive integer".into(),
        })
    })
}
