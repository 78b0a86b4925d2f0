//! Core relational storage implementation.
//!
//! This module provides the [`RelationalStore`] struct, the scratch database
//! it runs on, and the helpers shared by the entity operations.

#![allow(clippy::missing_errors_doc)]

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tempfile::TempDir;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::image;
use super::migrations;
use crate::error::StorageError;
use crate::storage::{BackendContext, SessionImage};

/// Backend name used in errors and logs.
pub(crate) const BACKEND: &str = "relational";

const DATABASE_FILE: &str = "liftlog.db";

/// A database file in a private temporary directory.
///
/// The directory, and the database with it, is removed on drop.
#[derive(Debug)]
pub(crate) struct Scratch {
    pub(crate) pool: SqlitePool,
    _dir: TempDir,
}

impl Scratch {
    /// Create a scratch database, optionally seeded with an image.
    pub(crate) async fn create(seed: Option<&[u8]>) -> Result<Self, StorageError> {
        let dir = tempfile::Builder::new()
            .prefix("liftlog-")
            .tempdir()
            .map_err(|e| internal(format!("Failed to create scratch directory: {e}")))?;
        let path = dir.path().join(DATABASE_FILE);

        if let Some(bytes) = seed {
            std::fs::write(&path, bytes)
                .map_err(|e| internal(format!("Failed to write database image: {e}")))?;
        }

        let pool = connect(&path).await?;
        Ok(Self { pool, _dir: dir })
    }
}

async fn connect(path: &Path) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| internal(format!("Failed to open database: {e}")))
}

/// Relational storage backend.
///
/// Runs on a single-connection pool, so operations are serialized. The
/// database is private to the instance; its contents outlive the instance
/// only through the [`SessionImage`], which is refreshed after every
/// committed write.
#[derive(Debug)]
pub struct RelationalStore {
    pub(crate) live: RwLock<Scratch>,
    pub(crate) context: BackendContext,
    session: SessionImage,
}

impl RelationalStore {
    /// Open a store and bring its schema up to date.
    ///
    /// The database is seeded from `import_image` when given (after schema
    /// validation), otherwise from the session image, otherwise empty. A
    /// rejected import image leaves the session image as it was; any other
    /// failure clears it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::SchemaValidation`] for a rejected import image,
    /// [`StorageError::ColorExhausted`] if the color back-fill runs out of
    /// attempts, and [`StorageError::InitFailed`] for engine failures.
    pub async fn open(
        context: BackendContext,
        session: SessionImage,
        import_image: Option<&[u8]>,
    ) -> Result<Self, StorageError> {
        let result = Self::open_seeded(context, session.clone(), import_image).await;
        if let Err(e) = &result {
            if import_image.is_some() {
                warn!(error = %e, "import image rejected, session image kept");
            } else {
                session.clear();
                tracing::error!(error = %e, "relational storage failed to open");
            }
        }
        result
    }

    async fn open_seeded(
        context: BackendContext,
        session: SessionImage,
        import_image: Option<&[u8]>,
    ) -> Result<Self, StorageError> {
        let scratch = if let Some(bytes) = import_image {
            let scratch = Scratch::create(Some(bytes))
                .await
                .map_err(image::rejected_from)?;
            image::validate_schema(&scratch.pool).await?;
            info!(bytes = bytes.len(), "seeding relational storage from imported image");
            scratch
        } else if let Some(bytes) = session.load() {
            info!(bytes = bytes.len(), "restoring relational storage from session image");
            Scratch::create(Some(&bytes)).await.map_err(init_failed)?
        } else {
            Scratch::create(None).await.map_err(init_failed)?
        };

        let store = Self {
            live: RwLock::new(scratch),
            context,
            session,
        };
        store.init().await?;
        Ok(store)
    }

    /// Apply pending migrations and refresh the session image.
    pub async fn init(&self) -> Result<(), StorageError> {
        let live = self.live.read().await;
        migrations::run_migrations(&live.pool, &self.context.allocator).await?;
        self.persist(&live.pool).await.map_err(init_failed)?;
        info!("relational storage ready");
        Ok(())
    }

    /// Mirror the database into the session image.
    pub(crate) async fn persist(&self, pool: &SqlitePool) -> Result<(), StorageError> {
        let bytes = image::snapshot(pool).await?;
        debug!(bytes = bytes.len(), "session image refreshed");
        self.session.store(bytes);
        Ok(())
    }

    /// Mirror the database after a committed write.
    ///
    /// The write already succeeded, so a failed snapshot is logged and the
    /// previous image stays until the next write refreshes it.
    pub(crate) async fn mirror(&self, pool: &SqlitePool) {
        if let Err(e) = self.persist(pool).await {
            warn!(error = %e, "session image not refreshed");
        }
    }

    /// Create a query error with the given query name.
    ///
    /// `SQLite` uniqueness and foreign key violations become
    /// [`StorageError::Constraint`].
    pub(crate) fn query_error(query: &str, err: &sqlx::Error) -> StorageError {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
                return StorageError::constraint(db_err.message().to_string());
            }
        }
        StorageError::QueryFailed {
            query: query.to_string(),
            message: err.to_string(),
        }
    }
}

pub(crate) fn internal(message: String) -> StorageError {
    StorageError::Internal { message }
}

pub(crate) fn init_failed(err: StorageError) -> StorageError {
    match err {
        StorageError::InitFailed { .. } => err,
        other => StorageError::InitFailed {
            backend: BACKEND.to_string(),
            message: other.to_string(),
        },
    }
}
