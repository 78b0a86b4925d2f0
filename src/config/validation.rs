//! Configuration validation.
//!
//! This module provides validation logic for configuration values,
//! ensuring they are within acceptable ranges.

use super::Config;
use crate::error::ConfigError;

/// Minimum color retry bound.
pub const MIN_COLOR_ATTEMPTS: u32 = 1;

/// Maximum color retry bound.
pub const MAX_COLOR_ATTEMPTS: u32 = 1000;

/// Validate configuration values.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if any value is out of range:
/// - `LIFTLOG_DATA_DIR` must not be empty
/// - `LIFTLOG_COLOR_ATTEMPTS` must be between 1 and 1000
#[must_use = "validation result should be checked"]
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.data_dir.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            var: "LIFTLOG_DATA_DIR".into(),
            reason: "must not be empty".into(),
        });
    }

    if !(MIN_COLOR_ATTEMPTS..=MAX_COLOR_ATTEMPTS).contains(&config.color_attempts) {
        return Err(ConfigError::InvalidValue {
            var: "LIFTLOG_COLOR_ATTEMPTS".into(),
            reason: format!("must be between {MIN_COLOR_ATTEMPTS} and {MAX_COLOR_ATTEMPTS}"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_empty_data_dir() {
        let config = Config {
            data_dir: "  ".into(),
            ..Config::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidValue { var, .. }) if var == "LIFTLOG_DATA_DIR"
        ));
    }

    #[test_case(0, false ; "zero")]
    #[test_case(1, true ; "minimum")]
    #[test_case(1000, true ; "maximum")]
    #[test_case(1001, false ; "above maximum")]
    fn test_color_attempts_bounds(attempts: u32, ok: bool) {
        let config = Config {
            color_attempts: attempts,
            ..Config::default()
        };
        assert_eq!(validate_config(&config).is_ok(), ok);
    }
}
