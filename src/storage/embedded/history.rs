//! History storage operations.

#![allow(clippy::missing_errors_doc)]

use std::collections::HashMap;

use redb::{ReadableDatabase, ReadableTable};
use tracing::debug;

use super::core::EmbeddedStore;
use super::tables::{
    decode, encode, exists, load, next_id, EngineResult, StoredHistory, HISTORY, HISTORY_BY_MOVE,
    MOVES,
};
use crate::error::StorageError;
use crate::traits::{HistoryEntry, Move, RecordId};
use crate::validation::{check_reps, check_weight};

impl EmbeddedStore {
    /// Record a set stamped with the current time.
    pub async fn add_history(
        &self,
        reps: i64,
        kg: f64,
        move_id: RecordId,
    ) -> Result<RecordId, StorageError> {
        let reps = check_reps(reps)?;
        let kg = check_weight(kg)?;
        let created = self.context.clock.now_millis();

        self.blocking(move |db, _| {
            let txn = db.begin_write().engine("begin write")?;
            let id = {
                let moves = txn.open_table(MOVES).engine("open moves")?;
                if !exists(&moves, move_id)? {
                    return Err(StorageError::not_found("move", move_id));
                }

                let id = next_id(&txn, &HISTORY)?;
                let record = StoredHistory {
                    id,
                    move_id,
                    reps,
                    kg,
                    created,
                };
                txn.open_table(HISTORY)
                    .engine("open history")?
                    .insert(id, encode(&record)?.as_slice())
                    .engine("write history")?;
                txn.open_table(HISTORY_BY_MOVE)
                    .engine("open history_by_move")?
                    .insert((move_id, id), ())
                    .engine("write history_by_move")?;
                id
            };
            txn.commit().engine("commit")?;

            debug!(id, move_id, reps, kg, "added history entry");
            Ok(id)
        })
        .await
    }

    /// All sets, oldest first.
    pub async fn get_all_history(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        self.blocking(move |db, _| {
            let read = db.begin_read().engine("begin read")?;
            let history = read.open_table(HISTORY).engine("open history")?;
            let moves = read.open_table(MOVES).engine("open moves")?;

            let mut names: HashMap<RecordId, Option<String>> = HashMap::new();
            let mut result = Vec::new();
            for entry in history.iter().engine("scan history")? {
                let (_, value) = entry.engine("scan history")?;
                let record: StoredHistory = decode(value.value())?;
                let name = match names.get(&record.move_id) {
                    Some(name) => name.clone(),
                    None => {
                        let name = load::<Move, _>(&moves, record.move_id)?.map(|m| m.name);
                        names.insert(record.move_id, name.clone());
                        name
                    }
                };
                if let Some(name) = name {
                    result.push(joined(record, name));
                }
            }

            sort_by_created(&mut result);
            Ok(result)
        })
        .await
    }

    /// All sets of one move, oldest first.
    pub async fn get_history_by_move(
        &self,
        move_id: RecordId,
    ) -> Result<Vec<HistoryEntry>, StorageError> {
        self.blocking(move |db, _| {
            let read = db.begin_read().engine("begin read")?;
            let moves = read.open_table(MOVES).engine("open moves")?;
            let Some(owner) = load::<Move, _>(&moves, move_id)? else {
                return Ok(Vec::new());
            };

            let history = read.open_table(HISTORY).engine("open history")?;
            let by_move = read
                .open_table(HISTORY_BY_MOVE)
                .engine("open history_by_move")?;

            let mut result = Vec::new();
            for entry in by_move
                .range((move_id, RecordId::MIN)..=(move_id, RecordId::MAX))
                .engine("scan history_by_move")?
            {
                let (key, _) = entry.engine("scan history_by_move")?;
                let (_, id) = key.value();
                if let Some(record) = load::<StoredHistory, _>(&history, id)? {
                    result.push(joined(record, owner.name.clone()));
                }
            }

            sort_by_created(&mut result);
            Ok(result)
        })
        .await
    }

    /// Change the weight and reps of a set.
    pub async fn update_history(
        &self,
        id: RecordId,
        kg: f64,
        reps: i64,
    ) -> Result<(), StorageError> {
        let kg = check_weight(kg)?;
        let reps = check_reps(reps)?;

        self.blocking(move |db, _| {
            let txn = db.begin_write().engine("begin write")?;
            {
                let mut history = txn.open_table(HISTORY).engine("open history")?;
                let mut record: StoredHistory = load(&history, id)?
                    .ok_or_else(|| StorageError::not_found("history entry", id))?;
                record.kg = kg;
                record.reps = reps;
                history
                    .insert(id, encode(&record)?.as_slice())
                    .engine("write history")?;
            }
            txn.commit().engine("commit")?;

            debug!(id, reps, kg, "updated history entry");
            Ok(())
        })
        .await
    }

    /// Delete a set.
    pub async fn delete_history(&self, id: RecordId) -> Result<(), StorageError> {
        self.blocking(move |db, _| {
            let txn = db.begin_write().engine("begin write")?;
            {
                let mut history = txn.open_table(HISTORY).engine("open history")?;
                let record: StoredHistory = load(&history, id)?
                    .ok_or_else(|| StorageError::not_found("history entry", id))?;
                history.remove(id).engine("delete history")?;
                txn.open_table(HISTORY_BY_MOVE)
                    .engine("open history_by_move")?
                    .remove((record.move_id, id))
                    .engine("delete history_by_move")?;
            }
            txn.commit().engine("commit")?;

            debug!(id, "deleted history entry");
            Ok(())
        })
        .await
    }
}

fn joined(record: StoredHistory, move_name: String) -> HistoryEntry {
    HistoryEntry {
        id: record.id,
        move_id: record.move_id,
        reps: record.reps,
        kg: record.kg,
        created: record.created,
        move_name,
    }
}

fn sort_by_created(entries: &mut [HistoryEntry]) {
    entries.sort_by_key(|entry| (entry.created, entry.id));
}
