//! Object store schema upgrades.
//!
//! The schema version lives in the `meta` table. Upgrades are monotonic and
//! run in one write transaction:
//! - below 2: every container and index is dropped and recreated
//! - below 3: the unique color index is created and filled from existing
//!   moves
//!
//! Moves still lacking a color are back-filled afterwards in a separate
//! transaction. The back-fill runs on every open, so an interrupted one is
//! finished next time.

#![allow(clippy::missing_errors_doc)]

use redb::{Database, ReadableTable, TableHandle, WriteTransaction};
use tracing::info;

use super::tables::{
    decode, encode, EngineResult, HISTORY, HISTORY_BY_MOVE, LABELS, LABELS_BY_NAME, META, MOVES,
    MOVES_BY_ACTIVE, MOVES_BY_COLOR, MOVES_BY_NAME, MOVE_LABELS, MOVE_LABELS_BY_PAIR,
    SCHEMA_VERSION_KEY, SEQUENCES,
};
use crate::color::ColorAllocator;
use crate::error::StorageError;
use crate::traits::Move;

/// Schema version written by this build.
pub const SCHEMA_VERSION: u64 = 3;

/// Bring the schema up to [`SCHEMA_VERSION`]. Returns the version found.
pub(crate) fn upgrade(db: &Database) -> Result<u64, StorageError> {
    let txn = db.begin_write().engine("begin upgrade")?;

    let found = txn
        .open_table(META)
        .engine("open meta")?
        .get(SCHEMA_VERSION_KEY)
        .engine("read schema version")?
        .map_or(0, |guard| guard.value());

    if found > SCHEMA_VERSION {
        return Err(StorageError::InitFailed {
            backend: super::core::BACKEND.to_string(),
            message: format!(
                "store is at schema version {found}, newer than the supported {SCHEMA_VERSION}"
            ),
        });
    }
    if found == SCHEMA_VERSION {
        return Ok(found);
    }

    if found < 2 {
        recreate_containers(&txn)?;
        info!(from = found, "created object store containers");
    }
    if found < 3 {
        index_colors(&txn)?;
        info!(from = found, "added move color index");
    }

    txn.open_table(META)
        .engine("open meta")?
        .insert(SCHEMA_VERSION_KEY, SCHEMA_VERSION)
        .engine("write schema version")?;
    txn.commit().engine("commit upgrade")?;

    Ok(found)
}

fn recreate_containers(txn: &WriteTransaction) -> Result<(), StorageError> {
    drop_table(txn, MOVES)?;
    drop_table(txn, HISTORY)?;
    drop_table(txn, LABELS)?;
    drop_table(txn, MOVE_LABELS)?;
    drop_table(txn, MOVES_BY_NAME)?;
    drop_table(txn, MOVES_BY_ACTIVE)?;
    drop_table(txn, MOVES_BY_COLOR)?;
    drop_table(txn, HISTORY_BY_MOVE)?;
    drop_table(txn, LABELS_BY_NAME)?;
    drop_table(txn, MOVE_LABELS_BY_PAIR)?;
    drop_table(txn, SEQUENCES)?;

    let _ = txn.open_table(MOVES).engine("create moves")?;
    let _ = txn.open_table(HISTORY).engine("create history")?;
    let _ = txn.open_table(LABELS).engine("create labels")?;
    let _ = txn.open_table(MOVE_LABELS).engine("create move_labels")?;
    let _ = txn.open_table(MOVES_BY_NAME).engine("create moves_by_name")?;
    let _ = txn.open_table(MOVES_BY_ACTIVE).engine("create moves_by_active")?;
    let _ = txn.open_table(HISTORY_BY_MOVE).engine("create history_by_move")?;
    let _ = txn.open_table(LABELS_BY_NAME).engine("create labels_by_name")?;
    let _ = txn
        .open_table(MOVE_LABELS_BY_PAIR)
        .engine("create move_labels_by_pair")?;
    let _ = txn.open_table(SEQUENCES).engine("create sequences")?;
    Ok(())
}

fn drop_table(txn: &WriteTransaction, table: impl TableHandle) -> Result<(), StorageError> {
    txn.delete_table(table).map(|_| ()).engine("delete table")
}

fn index_colors(txn: &WriteTransaction) -> Result<(), StorageError> {
    let moves = txn.open_table(MOVES).engine("open moves")?;
    let mut by_color = txn.open_table(MOVES_BY_COLOR).engine("create moves_by_color")?;

    for entry in moves.iter().engine("scan moves")? {
        let (_, value) = entry.engine("scan moves")?;
        let record: Move = decode(value.value())?;
        if let Some(color) = &record.color {
            if by_color
                .insert(color.as_str(), record.id)
                .engine("index color")?
                .is_some()
            {
                return Err(StorageError::constraint(format!(
                    "duplicate move color {color}"
                )));
            }
        }
    }
    Ok(())
}

/// Assign a color to every move lacking one. Returns the number filled.
pub(crate) fn backfill_colors(
    db: &Database,
    allocator: &ColorAllocator,
) -> Result<usize, StorageError> {
    let txn = db.begin_write().engine("begin back-fill")?;
    let filled = {
        let mut moves = txn.open_table(MOVES).engine("open moves")?;
        let mut by_color = txn.open_table(MOVES_BY_COLOR).engine("open color index")?;

        let mut colorless = Vec::new();
        for entry in moves.iter().engine("scan moves")? {
            let (_, value) = entry.engine("scan moves")?;
            let record: Move = decode(value.value())?;
            if record.color.is_none() {
                colorless.push(record);
            }
        }

        let count = colorless.len();
        for mut record in colorless {
            let color = allocator.allocate(|candidate| {
                Ok(by_color.get(candidate).engine("read color index")?.is_some())
            })?;
            by_color
                .insert(color.as_str(), record.id)
                .engine("index color")?;
            record.color = Some(color);
            moves
                .insert(record.id, encode(&record)?.as_slice())
                .engine("write move")?;
        }
        count
    };
    txn.commit().engine("commit back-fill")?;

    if filled > 0 {
        info!(moves = filled, "back-filled move colors");
    }
    Ok(filled)
}
