//! Backend selection.
//!
//! This module chooses and constructs exactly one backend:
//! - [`open_storage`]: open a given [`BackendKind`]
//! - [`select_backend`]: open the preferred kind, falling back to the
//!   embedded store when the relational backend cannot start
//! - [`switch_backend`]: remember a new preference for the next start
//!
//! The result is a [`Storage`] value that callers use through
//! [`StorageTrait`](crate::traits::StorageTrait) without branching on the
//! backend.

mod kind;
mod preference;
mod storage;

use std::path::PathBuf;

use tracing::{info, warn};

pub use kind::BackendKind;
pub use preference::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, PREFERENCE_FILE};
pub use storage::Storage;

use crate::error::{AppError, StorageError};
use crate::storage::{BackendContext, EmbeddedStore, RelationalStore, SessionImage};

/// File name of the embedded store inside the data directory.
pub const STORE_FILE: &str = "liftlog.redb";

/// Construction parameters shared by both backends.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Embedded store file. `None` keeps the store in memory.
    pub store_path: Option<PathBuf>,
    /// Image that seeds a relational backend.
    pub import_image: Option<Vec<u8>>,
    /// Session slot the relational backend restores from and mirrors into.
    pub session: SessionImage,
    /// Color allocator and clock.
    pub context: BackendContext,
}

impl OpenOptions {
    /// Options for an in-memory embedded store and a fresh session.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Keep the embedded store at `path`.
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Seed the relational backend from an image.
    #[must_use]
    pub fn with_import_image(mut self, image: Vec<u8>) -> Self {
        self.import_image = Some(image);
        self
    }

    /// Use an existing session slot.
    #[must_use]
    pub fn with_session(mut self, session: SessionImage) -> Self {
        self.session = session;
        self
    }

    /// Use a specific allocator and clock.
    #[must_use]
    pub fn with_context(mut self, context: BackendContext) -> Self {
        self.context = context;
        self
    }
}

/// Open and initialize one backend.
///
/// # Errors
///
/// Returns the backend's initialization error, or
/// [`StorageError::Unsupported`] when an import image is given for the
/// embedded store.
pub async fn open_storage(kind: BackendKind, options: OpenOptions) -> Result<Storage, StorageError> {
    match kind {
        BackendKind::EmbeddedStore => {
            if options.import_image.is_some() {
                return Err(StorageError::Unsupported {
                    operation: "import_image".into(),
                    backend: kind.to_string(),
                });
            }
            let store = match &options.store_path {
                Some(path) => EmbeddedStore::open(path, options.context).await?,
                None => EmbeddedStore::open_in_memory(options.context).await?,
            };
            Ok(Storage::Embedded(store))
        }
        BackendKind::Relational => {
            let store = RelationalStore::open(
                options.context,
                options.session,
                options.import_image.as_deref(),
            )
            .await?;
            Ok(Storage::Relational(store))
        }
    }
}

/// Open the preferred backend.
///
/// The preference defaults to `default` when none is stored. If the
/// relational backend fails to initialize, the embedded store is opened
/// instead and remembered as the preference. An embedded store failure is
/// returned as is.
///
/// # Errors
///
/// Returns [`AppError::Config`] if the preference cannot be read and
/// [`AppError::Storage`] if no backend can be opened.
pub async fn select_backend(
    preferences: &dyn PreferenceStore,
    default: BackendKind,
    options: OpenOptions,
) -> Result<Storage, AppError> {
    let preferred = preferences.load()?.unwrap_or(default);
    info!(backend = %preferred, "opening storage");

    match preferred {
        BackendKind::EmbeddedStore => Ok(open_storage(preferred, options).await?),
        BackendKind::Relational => {
            let fallback = OpenOptions {
                import_image: None,
                ..options.clone()
            };
            match open_storage(preferred, options).await {
                Ok(storage) => Ok(storage),
                Err(e) => {
                    warn!(error = %e, "relational storage failed, falling back to the embedded store");
                    let storage = open_storage(BackendKind::EmbeddedStore, fallback).await?;
                    if let Err(e) = preferences.save(BackendKind::EmbeddedStore) {
                        warn!(error = %e, "could not remember the fallback backend");
                    }
                    Ok(storage)
                }
            }
        }
    }
}

/// Remember `kind` as the preferred backend for the next start.
///
/// Switching to the embedded store forgets the relational session image.
///
/// # Errors
///
/// Returns [`AppError::Config`] if the preference cannot be written.
pub fn switch_backend(
    preferences: &dyn PreferenceStore,
    kind: BackendKind,
    session: &SessionImage,
) -> Result<(), AppError> {
    preferences.save(kind)?;
    if kind == BackendKind::EmbeddedStore {
        session.clear();
    }
    info!(backend = %kind, "switched preferred backend");
    Ok(())
}
