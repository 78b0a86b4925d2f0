//! Persisted backend preference.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::kind::BackendKind;
use crate::error::ConfigError;

/// File name of the preference inside the data directory.
pub const PREFERENCE_FILE: &str = "backend.json";

/// Where the preferred backend is remembered between runs.
#[cfg_attr(test, mockall::automock)]
pub trait PreferenceStore: Send + Sync {
    /// The stored preference, or `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Preference`] if the stored value is unreadable.
    fn load(&self) -> Result<Option<BackendKind>, ConfigError>;

    /// Remember a preference.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Preference`] if it cannot be written.
    fn save(&self, kind: BackendKind) -> Result<(), ConfigError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct PreferenceFile {
    backend: BackendKind,
}

/// JSON file preference store.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    /// Store the preference at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the preference as [`PREFERENCE_FILE`] inside `data_dir`.
    #[must_use]
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(PREFERENCE_FILE))
    }

    /// Location of the preference file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, action: &str, err: impl std::fmt::Display) -> ConfigError {
        ConfigError::Preference {
            message: format!("Failed to {action} {}: {err}", self.path.display()),
        }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Result<Option<BackendKind>, ConfigError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path).map_err(|e| self.error("read", e))?;
        let file: PreferenceFile =
            serde_json::from_str(&text).map_err(|e| self.error("parse", e))?;
        Ok(Some(file.backend))
    }

    fn save(&self, kind: BackendKind) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.error("create directory for", e))?;
        }
        let text = serde_json::to_string_pretty(&PreferenceFile { backend: kind })
            .map_err(|e| self.error("encode", e))?;
        fs::write(&self.path, text).map_err(|e| self.error("write", e))?;

        debug!(path = %self.path.display(), backend = %kind, "saved backend preference");
        Ok(())
    }
}

/// In-process preference store.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    slot: Mutex<Option<BackendKind>>,
}

impl MemoryPreferenceStore {
    /// Create a store holding `initial`.
    #[must_use]
    pub fn new(initial: Option<BackendKind>) -> Self {
        Self {
            slot: Mutex::new(initial),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Option<BackendKind>, ConfigError> {
        Ok(*self.slot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn save(&self, kind: BackendKind) -> Result<(), ConfigError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(kind);
        Ok(())
    }
}
