//! Input validation.
//!
//! Pure functions that normalize and bound-check raw input before it reaches
//! a backend. Every write path in both backends calls into this module; the
//! backends never trust caller-supplied values.
//!
//! # Example
//!
//! ```
//! use liftlog::validation::{validate_exercise_name, validate_reps, validate_weight};
//!
//! assert_eq!(validate_exercise_name("  Front Squat ").unwrap(), "Front Squat");
//! assert_eq!(validate_weight("102.5").unwrap(), 102.5);
//! assert_eq!(validate_reps("8").unwrap(), 8);
//! assert!(validate_reps("10000").is_err());
//! ```

use crate::error::ValidationError;

/// Maximum length of an exercise or label name, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// Largest accepted weight in kilograms.
pub const MAX_WEIGHT: u32 = 9999;

/// Largest accepted repetition count.
pub const MAX_REPS: u32 = 9999;

const NAME_FIELD: &str = "Exercise name";

/// Validate and normalize an exercise name.
///
/// Accepts letters, digits, whitespace, `-`, `_`, `(` and `)`.
///
/// # Errors
///
/// Returns [`ValidationError`] if the trimmed input is empty, longer than
/// [`MAX_NAME_LEN`] characters, or contains any other character.
pub fn validate_exercise_name(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty {
            field: NAME_FIELD.into(),
        });
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: NAME_FIELD.into(),
            max: MAX_NAME_LEN,
        });
    }
    if !trimmed.chars().all(is_name_char) {
        return Err(ValidationError::InvalidCharacters {
            field: NAME_FIELD.into(),
        });
    }
    Ok(trimmed.to_string())
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '_' | '(' | ')')
}

/// Parse and range-check a weight in kilograms.
///
/// # Errors
///
/// Returns [`ValidationError`] if the input is not a finite number or lies
/// outside `[0, 9999]`.
pub fn validate_weight(input: &str) -> Result<f64, ValidationError> {
    let value = input
        .trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::NotANumber {
            field: "weight".into(),
            value: input.to_string(),
        })?;
    check_weight(value)
}

/// Range-check a weight that is already numeric.
///
/// # Errors
///
/// Returns [`ValidationError`] for NaN, infinities, and values outside
/// `[0, 9999]`.
pub fn check_weight(value: f64) -> Result<f64, ValidationError> {
    if value.is_nan() {
        return Err(ValidationError::NotANumber {
            field: "weight".into(),
            value: value.to_string(),
        });
    }
    if !(0.0..=f64::from(MAX_WEIGHT)).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: "weight".into(),
            min: 0,
            max: MAX_WEIGHT,
        });
    }
    Ok(value)
}

/// Parse and range-check a repetition count.
///
/// # Errors
///
/// Returns [`ValidationError`] if the input is not an integer or lies outside
/// `[0, 9999]`.
pub fn validate_reps(input: &str) -> Result<u32, ValidationError> {
    let value = input
        .trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::NotANumber {
            field: "reps".into(),
            value: input.to_string(),
        })?;
    check_reps(value)
}

/// Range-check a repetition count that is already numeric.
///
/// # Errors
///
/// Returns [`ValidationError::OutOfRange`] outside `[0, 9999]`.
pub fn check_reps(value: i64) -> Result<u32, ValidationError> {
    u32::try_from(value)
        .ok()
        .filter(|reps| *reps <= MAX_REPS)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "reps".into(),
            min: 0,
            max: MAX_REPS,
        })
}
