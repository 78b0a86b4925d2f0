//! Move storage operations.

#![allow(clippy::missing_errors_doc)]

use std::collections::HashSet;

use redb::{ReadableDatabase, ReadableTable};
use tracing::debug;

use super::core::EmbeddedStore;
use super::tables::{
    active_key, encode, load, next_id, EngineResult, HISTORY_BY_MOVE, MOVES,
    MOVES_BY_ACTIVE, MOVES_BY_COLOR, MOVES_BY_NAME, MOVE_LABELS, MOVE_LABELS_BY_PAIR,
};
use crate::error::{StorageError, ValidationError};
use crate::traits::{Move, MoveUpdate, RecordId};
use crate::validation::validate_exercise_name;

impl EmbeddedStore {
    /// Create an active move with a freshly allocated color.
    pub async fn add_move(&self, name: &str) -> Result<RecordId, StorageError> {
        let name = validate_exercise_name(name)?;

        self.blocking(move |db, context| {
            let txn = db.begin_write().engine("begin write")?;

            let record = {
                let mut moves = txn.open_table(MOVES).engine("open moves")?;
                let mut by_name = txn.open_table(MOVES_BY_NAME).engine("open moves_by_name")?;
                let mut by_color = txn.open_table(MOVES_BY_COLOR).engine("open moves_by_color")?;
                let mut by_active = txn
                    .open_table(MOVES_BY_ACTIVE)
                    .engine("open moves_by_active")?;

                if by_name.get(name.as_str()).engine("read moves_by_name")?.is_some() {
                    return Err(StorageError::constraint(format!(
                        "A move named '{name}' already exists"
                    )));
                }
                let color = context.allocator.allocate(|candidate| {
                    Ok(by_color
                        .get(candidate)
                        .engine("read moves_by_color")?
                        .is_some())
                })?;

                let id = next_id(&txn, &MOVES)?;
                let record = Move::new(id, name).with_color(color);

                moves
                    .insert(id, encode(&record)?.as_slice())
                    .engine("write move")?;
                by_name
                    .insert(record.name.as_str(), id)
                    .engine("write moves_by_name")?;
                if let Some(color) = &record.color {
                    by_color
                        .insert(color.as_str(), id)
                        .engine("write moves_by_color")?;
                }
                by_active
                    .insert(active_key(true, id), ())
                    .engine("write moves_by_active")?;
                record
            };
            txn.commit().engine("commit")?;

            debug!(id = record.id, name = %record.name, color = ?record.color, "added move");
            Ok(record.id)
        })
        .await
    }

    /// Get a move by ID.
    pub async fn get_move_by_id(&self, id: RecordId) -> Result<Option<Move>, StorageError> {
        self.blocking(move |db, _| {
            let read = db.begin_read().engine("begin read")?;
            let moves = read.open_table(MOVES).engine("open moves")?;
            load(&moves, id)
        })
        .await
    }

    /// Get all moves ordered by name.
    pub async fn get_all_moves(&self, active_only: bool) -> Result<Vec<Move>, StorageError> {
        self.blocking(move |db, _| {
            let read = db.begin_read().engine("begin read")?;
            let moves = read.open_table(MOVES).engine("open moves")?;
            let by_name = read.open_table(MOVES_BY_NAME).engine("open moves_by_name")?;

            let active: Option<HashSet<RecordId>> = if active_only {
                let by_active = read
                    .open_table(MOVES_BY_ACTIVE)
                    .engine("open moves_by_active")?;
                let mut ids = HashSet::new();
                for entry in by_active
                    .range(active_key(true, RecordId::MIN)..=active_key(true, RecordId::MAX))
                    .engine("scan moves_by_active")?
                {
                    let (key, _) = entry.engine("scan moves_by_active")?;
                    ids.insert(key.value().1);
                }
                Some(ids)
            } else {
                None
            };

            let mut result = Vec::new();
            for entry in by_name.iter().engine("scan moves_by_name")? {
                let (_, id) = entry.engine("scan moves_by_name")?;
                let id = id.value();
                if active.as_ref().is_some_and(|ids| !ids.contains(&id)) {
                    continue;
                }
                if let Some(record) = load(&moves, id)? {
                    result.push(record);
                }
            }
            Ok(result)
        })
        .await
    }

    /// Overwrite the editable fields of a move.
    pub async fn update_move(&self, id: RecordId, update: &MoveUpdate) -> Result<(), StorageError> {
        let name = validate_exercise_name(&update.name)?;
        let color = match update.color.as_deref().map(str::trim) {
            Some("") => {
                return Err(ValidationError::Empty {
                    field: "color".into(),
                }
                .into())
            }
            other => other.map(str::to_string),
        };

        let update = update.clone();
        self.blocking(move |db, _| {
            let txn = db.begin_write().engine("begin write")?;
            {
                let mut moves = txn.open_table(MOVES).engine("open moves")?;
                let mut by_name = txn.open_table(MOVES_BY_NAME).engine("open moves_by_name")?;
                let mut by_color = txn.open_table(MOVES_BY_COLOR).engine("open moves_by_color")?;
                let mut by_active = txn
                    .open_table(MOVES_BY_ACTIVE)
                    .engine("open moves_by_active")?;

                let current: Move =
                    load(&moves, id)?.ok_or_else(|| StorageError::not_found("move", id))?;

                let name_owner = by_name
                    .get(name.as_str())
                    .engine("read moves_by_name")?
                    .map(|guard| guard.value());
                if name_owner.is_some_and(|owner| owner != id) {
                    return Err(StorageError::constraint(format!(
                        "A move named '{name}' already exists"
                    )));
                }
                let new_color = color.filter(|c| current.color.as_ref() != Some(c));
                if let Some(c) = &new_color {
                    if by_color
                        .get(c.as_str())
                        .engine("read moves_by_color")?
                        .is_some()
                    {
                        return Err(StorageError::constraint(
                            "This color is already in use by another exercise",
                        ));
                    }
                }

                let updated = Move {
                    id,
                    name,
                    description: update.description.clone(),
                    youtube_link: update.youtube_link.clone(),
                    is_active: update.is_active,
                    color: new_color.clone().or_else(|| current.color.clone()),
                };

                if updated.name != current.name {
                    by_name
                        .remove(current.name.as_str())
                        .engine("write moves_by_name")?;
                    by_name
                        .insert(updated.name.as_str(), id)
                        .engine("write moves_by_name")?;
                }
                if let Some(c) = &new_color {
                    if let Some(old) = &current.color {
                        by_color
                            .remove(old.as_str())
                            .engine("write moves_by_color")?;
                    }
                    by_color
                        .insert(c.as_str(), id)
                        .engine("write moves_by_color")?;
                }
                if updated.is_active != current.is_active {
                    by_active
                        .remove(active_key(current.is_active, id))
                        .engine("write moves_by_active")?;
                    by_active
                        .insert(active_key(updated.is_active, id), ())
                        .engine("write moves_by_active")?;
                }
                moves
                    .insert(id, encode(&updated)?.as_slice())
                    .engine("write move")?;
            }
            txn.commit().engine("commit")?;

            debug!(id, "updated move");
            Ok(())
        })
        .await
    }

    /// Delete a move with no history, along with its label associations.
    pub async fn delete_move(&self, id: RecordId) -> Result<(), StorageError> {
        self.blocking(move |db, _| {
            let txn = db.begin_write().engine("begin write")?;
            let detached = {
                let mut moves = txn.open_table(MOVES).engine("open moves")?;
                let history_by_move = txn
                    .open_table(HISTORY_BY_MOVE)
                    .engine("open history_by_move")?;

                let current: Move =
                    load(&moves, id)?.ok_or_else(|| StorageError::not_found("move", id))?;

                let sets = history_by_move
                    .range((id, RecordId::MIN)..=(id, RecordId::MAX))
                    .engine("scan history_by_move")?
                    .count();
                if sets > 0 {
                    return Err(StorageError::constraint(format!(
                        "Cannot delete a move with history ({sets} sets recorded)"
                    )));
                }

                let mut move_labels = txn.open_table(MOVE_LABELS).engine("open move_labels")?;
                let mut by_pair = txn
                    .open_table(MOVE_LABELS_BY_PAIR)
                    .engine("open move_labels_by_pair")?;
                let mut pairs = Vec::new();
                for entry in by_pair
                    .range((id, RecordId::MIN)..=(id, RecordId::MAX))
                    .engine("scan move_labels_by_pair")?
                {
                    let (key, value) = entry.engine("scan move_labels_by_pair")?;
                    pairs.push((key.value(), value.value()));
                }
                for (pair, move_label_id) in &pairs {
                    by_pair.remove(pair).engine("delete move_labels_by_pair")?;
                    move_labels
                        .remove(move_label_id)
                        .engine("delete move_label")?;
                }

                txn.open_table(MOVES_BY_NAME)
                    .engine("open moves_by_name")?
                    .remove(current.name.as_str())
                    .engine("delete moves_by_name")?;
                if let Some(color) = &current.color {
                    txn.open_table(MOVES_BY_COLOR)
                        .engine("open moves_by_color")?
                        .remove(color.as_str())
                        .engine("delete moves_by_color")?;
                }
                txn.open_table(MOVES_BY_ACTIVE)
                    .engine("open moves_by_active")?
                    .remove(active_key(current.is_active, id))
                    .engine("delete moves_by_active")?;
                moves.remove(id).engine("delete move")?;
                pairs.len()
            };
            txn.commit().engine("commit")?;

            debug!(id, labels = detached, "deleted move");
            Ok(())
        })
        .await
    }

    /// Draw a color not used by any stored move.
    pub async fn generate_unique_color(&self) -> Result<String, StorageError> {
        self.blocking(move |db, context| {
            let read = db.begin_read().engine("begin read")?;
            let by_color = read
                .open_table(MOVES_BY_COLOR)
                .engine("open moves_by_color")?;
            context.allocator.allocate(|candidate| {
                Ok(by_color
                    .get(candidate)
                    .engine("read moves_by_color")?
                    .is_some())
            })
        })
        .await
    }
}
