//! Table layout of the embedded object store.
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `moves` | `id` | `Move` | Move records |
//! | `history` | `id` | `StoredHistory` | Recorded sets |
//! | `labels` | `id` | `Label` | Label records |
//! | `move_labels` | `id` | `StoredMoveLabel` | Move-label associations |
//! | `moves_by_name` | `name` | `id` | Unique name index |
//! | `moves_by_active` | `(is_active, id)` | `()` | Active flag index |
//! | `moves_by_color` | `color` | `id` | Unique color index (version 3) |
//! | `history_by_move` | `(move_id, id)` | `()` | Sets per move |
//! | `labels_by_name` | `name` | `id` | Unique name index |
//! | `move_labels_by_pair` | `(move_id, label_id)` | `id` | Unique pair index |
//! | `sequences` | container name | `u64` | Last assigned id |
//! | `meta` | key | `u64` | Schema version |
//!
//! Records are JSON-encoded. Index tables are written in the same
//! transaction as the record they point at.

use redb::{ReadableTable, TableDefinition, TableHandle, WriteTransaction};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::traits::RecordId;

pub(crate) const MOVES: TableDefinition<i64, &[u8]> = TableDefinition::new("moves");
pub(crate) const HISTORY: TableDefinition<i64, &[u8]> = TableDefinition::new("history");
pub(crate) const LABELS: TableDefinition<i64, &[u8]> = TableDefinition::new("labels");
pub(crate) const MOVE_LABELS: TableDefinition<i64, &[u8]> = TableDefinition::new("move_labels");

pub(crate) const MOVES_BY_NAME: TableDefinition<&str, i64> = TableDefinition::new("moves_by_name");
pub(crate) const MOVES_BY_ACTIVE: TableDefinition<(u8, i64), ()> =
    TableDefinition::new("moves_by_active");
pub(crate) const MOVES_BY_COLOR: TableDefinition<&str, i64> =
    TableDefinition::new("moves_by_color");
pub(crate) const HISTORY_BY_MOVE: TableDefinition<(i64, i64), ()> =
    TableDefinition::new("history_by_move");
pub(crate) const LABELS_BY_NAME: TableDefinition<&str, i64> =
    TableDefinition::new("labels_by_name");
pub(crate) const MOVE_LABELS_BY_PAIR: TableDefinition<(i64, i64), i64> =
    TableDefinition::new("move_labels_by_pair");

pub(crate) const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");
pub(crate) const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

pub(crate) const SCHEMA_VERSION_KEY: &str = "schema_version";

/// A recorded set as stored; the move name is joined on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredHistory {
    pub id: RecordId,
    pub move_id: RecordId,
    pub reps: u32,
    pub kg: f64,
    pub created: i64,
}

/// A move-label association as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredMoveLabel {
    pub id: RecordId,
    pub move_id: RecordId,
    pub label_id: RecordId,
}

/// Key into the active flag index.
pub(crate) fn active_key(is_active: bool, id: RecordId) -> (u8, i64) {
    (u8::from(is_active), id)
}

/// Map an engine error into a [`StorageError::QueryFailed`] naming the
/// operation.
pub(crate) trait EngineResult<T> {
    fn engine(self, operation: &str) -> Result<T, StorageError>;
}

impl<T, E: std::fmt::Display> EngineResult<T> for Result<T, E> {
    fn engine(self, operation: &str) -> Result<T, StorageError> {
        self.map_err(|e| StorageError::QueryFailed {
            query: operation.to_string(),
            message: e.to_string(),
        })
    }
}

pub(crate) fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(record).map_err(|e| StorageError::Internal {
        message: format!("Failed to encode record: {e}"),
    })
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::Internal {
        message: format!("Failed to decode record: {e}"),
    })
}

/// Load and decode one record.
pub(crate) fn load<T, R>(table: &R, id: RecordId) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    R: ReadableTable<i64, &'static [u8]>,
{
    table
        .get(id)
        .engine("get record")?
        .map(|guard| decode(guard.value()))
        .transpose()
}

/// Whether a record with this id exists.
pub(crate) fn exists<R>(table: &R, id: RecordId) -> Result<bool, StorageError>
where
    R: ReadableTable<i64, &'static [u8]>,
{
    Ok(table.get(id).engine("get record")?.is_some())
}

/// Reserve the next id of a container.
pub(crate) fn next_id(
    txn: &WriteTransaction,
    container: &impl TableHandle,
) -> Result<RecordId, StorageError> {
    let mut sequences = txn.open_table(SEQUENCES).engine("open sequences")?;
    let next = sequences
        .get(container.name())
        .engine("read sequence")?
        .map_or(0, |guard| guard.value())
        + 1;
    sequences
        .insert(container.name(), next)
        .engine("write sequence")?;
    RecordId::try_from(next).map_err(|_| StorageError::Internal {
        message: format!("id space of {} exhausted", container.name()),
    })
}
