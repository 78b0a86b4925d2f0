//! Core embedded storage implementation.
//!
//! This module provides the main [`EmbeddedStore`] struct, opening and
//! initialization.

#![allow(clippy::missing_errors_doc)]

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use redb::Database;
use tracing::info;

use super::migrations::{self, SCHEMA_VERSION};
use crate::error::StorageError;
use crate::storage::BackendContext;

/// Backend name used in errors and logs.
pub(crate) const BACKEND: &str = "embedded-store";

/// Embedded object-store backend.
///
/// A `redb` database of JSON records with explicit index tables. Writers
/// are serialized by `redb` write transactions; every logical write,
/// cascades included, commits as one transaction. Transactions run on the
/// blocking thread pool, since commits sync to disk.
pub struct EmbeddedStore {
    pub(crate) db: Arc<Database>,
    pub(crate) context: BackendContext,
    location: String,
}

impl fmt::Debug for EmbeddedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedStore")
            .field("location", &self.location)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl EmbeddedStore {
    /// Open or create the store at `path` and bring its schema up to date.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InitFailed`] if the file cannot be opened or
    /// upgraded, or [`StorageError::ColorExhausted`] if the color back-fill
    /// runs out of attempts.
    pub async fn open(
        path: impl AsRef<Path>,
        context: BackendContext,
    ) -> Result<Self, StorageError> {
        let path = path.as_ref();

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                init_failed(format!("Failed to create store directory: {e}"))
            })?;
        }

        let db = Database::create(path)
            .map_err(|e| init_failed(format!("Failed to open {}: {e}", path.display())))?;

        Self::from_database(db, context, path.display().to_string()).await
    }

    /// Open a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InitFailed`] if the store cannot be created.
    pub async fn open_in_memory(context: BackendContext) -> Result<Self, StorageError> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(|e| init_failed(format!("Failed to create in-memory store: {e}")))?;

        Self::from_database(db, context, "memory".to_string()).await
    }

    async fn from_database(
        db: Database,
        context: BackendContext,
        location: String,
    ) -> Result<Self, StorageError> {
        let store = Self {
            db: Arc::new(db),
            context,
            location,
        };
        store.init().await?;
        Ok(store)
    }

    /// Apply pending schema upgrades, then back-fill missing move colors.
    pub async fn init(&self) -> Result<(), StorageError> {
        let found = self
            .blocking(|db, context| {
                let found = migrations::upgrade(db)?;
                migrations::backfill_colors(db, &context.allocator)?;
                Ok(found)
            })
            .await
            .map_err(into_init_error)?;
        if found < SCHEMA_VERSION {
            info!(
                location = %self.location,
                from = found,
                to = SCHEMA_VERSION,
                "upgraded object store schema"
            );
        }

        info!(location = %self.location, "embedded storage ready");
        Ok(())
    }

    /// Run `op` against the database on the blocking thread pool.
    pub(crate) async fn blocking<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Database, &BackendContext) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let context = self.context.clone();
        tokio::task::spawn_blocking(move || op(&db, &context))
            .await
            .map_err(|e| StorageError::Internal {
                message: format!("storage task failed: {e}"),
            })?
    }
}

fn init_failed(message: String) -> StorageError {
    StorageError::InitFailed {
        backend: BACKEND.to_string(),
        message,
    }
}

fn into_init_error(err: StorageError) -> StorageError {
    match err {
        StorageError::InitFailed { .. } | StorageError::ColorExhausted { .. } => err,
        other => init_failed(other.to_string()),
    }
}
