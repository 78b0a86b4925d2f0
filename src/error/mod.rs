//! Error types for the liftlog storage core.
//!
//! This module defines a hierarchical error system:
//! - [`AppError`]: Top-level application errors
//! - [`StorageError`]: Errors surfaced across the storage boundary
//! - [`ValidationError`]: Rejected user input
//! - [`ConfigError`]: Configuration errors
//!
//! All errors implement `Send + Sync` for async compatibility.
//!
//! The storage taxonomy maps onto the boundary contract as follows:
//!
//! | Boundary error          | Variant                                |
//! |-------------------------|----------------------------------------|
//! | `ValidationError`       | [`StorageError::Validation`]           |
//! | `NotFoundError`         | [`StorageError::NotFound`]             |
//! | `ConstraintError`       | [`StorageError::Constraint`]           |
//! | `ColorExhaustionError`  | [`StorageError::ColorExhausted`]       |
//! | `StorageInitError`      | [`StorageError::InitFailed`]           |
//! | `SchemaValidationError` | [`StorageError::SchemaValidation`]     |

use thiserror::Error;

/// Top-level application error.
///
/// Returned by the binary entry point; wraps all subsystem errors.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Command line usage error.
    #[error("Usage error: {message}")]
    Usage {
        /// What was wrong with the invocation.
        message: String,
    },
}

impl AppError {
    /// Whether the user can fix the input and run the command again.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_recoverable(),
            Self::Usage { .. } => true,
            Self::Config(_) => false,
        }
    }

    /// Process exit code: 2 for input the user can correct, 1 otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.is_recoverable() {
            2
        } else {
            1
        }
    }
}

/// Input validation errors.
///
/// Caller mistakes. They never touch stored state and are recoverable by
/// re-prompting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text was empty after trimming.
    #[error("{field} cannot be empty")]
    Empty {
        /// The field name.
        field: String,
    },

    /// Text exceeded the maximum length.
    #[error("{field} cannot exceed {max} characters")]
    TooLong {
        /// The field name.
        field: String,
        /// Maximum number of characters.
        max: usize,
    },

    /// Text contained characters outside the allowed set.
    #[error("{field} has invalid characters")]
    InvalidCharacters {
        /// The field name.
        field: String,
    },

    /// Value could not be parsed as a number.
    #[error("Invalid {field}: '{value}' is not a number")]
    NotANumber {
        /// The field name.
        field: String,
        /// The raw input.
        value: String,
    },

    /// Value was outside the accepted range.
    #[error("Invalid {field}: must be between {min} and {max}")]
    OutOfRange {
        /// The field name.
        field: String,
        /// Inclusive lower bound.
        min: u32,
        /// Inclusive upper bound.
        max: u32,
    },
}

/// Storage errors.
///
/// Raised by both backends and passed through the storage trait unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Input failed validation before anything was written.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A write referenced a row that does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record (move, history entry, label, move label).
        entity: String,
        /// The id that was looked up.
        id: i64,
    },

    /// The write would violate a uniqueness or relationship constraint.
    #[error("Constraint violation: {message}")]
    Constraint {
        /// Description of the violated constraint.
        message: String,
    },

    /// The color allocator ran out of attempts.
    #[error("Could not generate a unique color after {attempts} attempts")]
    ColorExhausted {
        /// Number of candidates drawn.
        attempts: u32,
    },

    /// The backend could not be opened or migrated.
    #[error("Failed to initialize {backend} storage: {message}")]
    InitFailed {
        /// Backend name.
        backend: String,
        /// Description of the failure.
        message: String,
    },

    /// An imported database image does not have the required schema.
    #[error("Invalid database image: {message}")]
    SchemaValidation {
        /// Which check failed.
        message: String,
    },

    /// The active backend does not offer this operation.
    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        /// The operation name.
        operation: String,
        /// Backend name.
        backend: String,
    },

    /// A database query failed.
    #[error("Query failed: {query} - {message}")]
    QueryFailed {
        /// The query that failed (may be truncated).
        query: String,
        /// Description of the failure.
        message: String,
    },

    /// Internal storage error.
    #[error("Internal storage error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Shorthand for [`StorageError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &str, id: i64) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id,
        }
    }

    /// Shorthand for [`StorageError::Constraint`].
    #[must_use]
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint {
            message: message.into(),
        }
    }

    /// Returns true for input and integrity errors.
    ///
    /// These leave stored data untouched and the caller may correct the
    /// input and try again. Resource errors must not be retried.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound { .. } | Self::Constraint { .. }
        )
    }
}

/// Configuration errors.
///
/// These errors represent failures in configuration loading and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration value is invalid.
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue {
        /// The variable name.
        var: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// The persisted backend preference could not be read or written.
    #[error("Preference store error: {message}")]
    Preference {
        /// Description of the failure.
        message: String,
    },
}
