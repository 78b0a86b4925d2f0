//! The selected backend.

#![allow(clippy::missing_errors_doc)]

use async_trait::async_trait;

use super::kind::BackendKind;
use crate::error::StorageError;
use crate::storage::{EmbeddedStore, RelationalStore};
use crate::traits::{HistoryEntry, Label, Move, MoveLabel, MoveUpdate, RecordId, StorageTrait};

/// One initialized backend, chosen once at startup.
#[derive(Debug)]
pub enum Storage {
    /// The embedded object store.
    Embedded(EmbeddedStore),
    /// The relational store.
    Relational(RelationalStore),
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            Storage::Embedded($store) => $call,
            Storage::Relational($store) => $call,
        }
    };
}

impl Storage {
    /// Which backend this is.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Embedded(_) => BackendKind::EmbeddedStore,
            Self::Relational(_) => BackendKind::Relational,
        }
    }

    /// Serialize the database. Relational backend only.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unsupported`] on the embedded store.
    pub async fn export_image(&self) -> Result<Vec<u8>, StorageError> {
        match self {
            Self::Relational(store) => store.export_image().await,
            Self::Embedded(_) => Err(self.unsupported("export_image")),
        }
    }

    /// Replace the database with an imported image. Relational backend only.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::SchemaValidation`] for a rejected image and
    /// [`StorageError::Unsupported`] on the embedded store.
    pub async fn import_image(&self, image: &[u8]) -> Result<(), StorageError> {
        match self {
            Self::Relational(store) => store.import_image(image).await,
            Self::Embedded(_) => Err(self.unsupported("import_image")),
        }
    }

    fn unsupported(&self, operation: &str) -> StorageError {
        StorageError::Unsupported {
            operation: operation.to_string(),
            backend: self.kind().to_string(),
        }
    }
}

#[async_trait]
impl StorageTrait for Storage {
    async fn init(&self) -> Result<(), StorageError> {
        dispatch!(self, store => store.init().await)
    }

    async fn add_history(
        &self,
        reps: i64,
        kg: f64,
        move_id: RecordId,
    ) -> Result<RecordId, StorageError> {
        dispatch!(self, store => store.add_history(reps, kg, move_id).await)
    }

    async fn get_all_history(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        dispatch!(self, store => store.get_all_history().await)
    }

    async fn update_history(&self, id: RecordId, kg: f64, reps: i64) -> Result<(), StorageError> {
        dispatch!(self, store => store.update_history(id, kg, reps).await)
    }

    async fn delete_history(&self, id: RecordId) -> Result<(), StorageError> {
        dispatch!(self, store => store.delete_history(id).await)
    }

    async fn get_history_by_move(
        &self,
        move_id: RecordId,
    ) -> Result<Vec<HistoryEntry>, StorageError> {
        dispatch!(self, store => store.get_history_by_move(move_id).await)
    }

    async fn add_move(&self, name: &str) -> Result<RecordId, StorageError> {
        dispatch!(self, store => store.add_move(name).await)
    }

    async fn get_move_by_id(&self, id: RecordId) -> Result<Option<Move>, StorageError> {
        dispatch!(self, store => store.get_move_by_id(id).await)
    }

    async fn get_all_moves(&self, active_only: bool) -> Result<Vec<Move>, StorageError> {
        dispatch!(self, store => store.get_all_moves(active_only).await)
    }

    async fn update_move(&self, id: RecordId, update: &MoveUpdate) -> Result<(), StorageError> {
        dispatch!(self, store => store.update_move(id, update).await)
    }

    async fn delete_move(&self, id: RecordId) -> Result<(), StorageError> {
        dispatch!(self, store => store.delete_move(id).await)
    }

    async fn add_label(&self, name: &str) -> Result<RecordId, StorageError> {
        dispatch!(self, store => store.add_label(name).await)
    }

    async fn get_all_labels(&self) -> Result<Vec<Label>, StorageError> {
        dispatch!(self, store => store.get_all_labels().await)
    }

    async fn add_label_to_move(
        &self,
        move_id: RecordId,
        label_id: RecordId,
    ) -> Result<RecordId, StorageError> {
        dispatch!(self, store => store.add_label_to_move(move_id, label_id).await)
    }

    async fn get_labels_for_move(
        &self,
        move_id: RecordId,
    ) -> Result<Vec<MoveLabel>, StorageError> {
        dispatch!(self, store => store.get_labels_for_move(move_id).await)
    }

    async fn remove_label_from_move(&self, move_label_id: RecordId) -> Result<(), StorageError> {
        dispatch!(self, store => store.remove_label_from_move(move_label_id).await)
    }

    async fn generate_unique_color(&self) -> Result<String, StorageError> {
        dispatch!(self, store => store.generate_unique_color().await)
    }
}
