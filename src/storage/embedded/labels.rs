//! Label storage operations.

#![allow(clippy::missing_errors_doc)]

use redb::{ReadableDatabase, ReadableTable};
use tracing::debug;

use super::core::EmbeddedStore;
use super::tables::{
    encode, exists, load, next_id, EngineResult, StoredMoveLabel, LABELS, LABELS_BY_NAME, MOVES,
    MOVE_LABELS, MOVE_LABELS_BY_PAIR,
};
use crate::error::StorageError;
use crate::traits::{Label, MoveLabel, RecordId};
use crate::validation::validate_exercise_name;

impl EmbeddedStore {
    /// Create a label.
    pub async fn add_label(&self, name: &str) -> Result<RecordId, StorageError> {
        let name = validate_exercise_name(name)?;

        self.blocking(move |db, _| {
            let txn = db.begin_write().engine("begin write")?;
            let id = {
                let mut by_name = txn.open_table(LABELS_BY_NAME).engine("open labels_by_name")?;
                if by_name.get(name.as_str()).engine("read labels_by_name")?.is_some() {
                    return Err(StorageError::constraint(format!(
                        "A label named '{name}' already exists"
                    )));
                }

                let id = next_id(&txn, &LABELS)?;
                let record = Label::new(id, name.as_str());
                txn.open_table(LABELS)
                    .engine("open labels")?
                    .insert(id, encode(&record)?.as_slice())
                    .engine("write label")?;
                by_name
                    .insert(name.as_str(), id)
                    .engine("write labels_by_name")?;
                id
            };
            txn.commit().engine("commit")?;

            debug!(id, name = %name, "added label");
            Ok(id)
        })
        .await
    }

    /// All labels ordered by name.
    pub async fn get_all_labels(&self) -> Result<Vec<Label>, StorageError> {
        self.blocking(move |db, _| {
            let read = db.begin_read().engine("begin read")?;
            let labels = read.open_table(LABELS).engine("open labels")?;
            let by_name = read.open_table(LABELS_BY_NAME).engine("open labels_by_name")?;

            let mut result = Vec::new();
            for entry in by_name.iter().engine("scan labels_by_name")? {
                let (_, id) = entry.engine("scan labels_by_name")?;
                if let Some(label) = load::<Label, _>(&labels, id.value())? {
                    result.push(label);
                }
            }
            Ok(result)
        })
        .await
    }

    /// Attach a label to a move. Returns the association id.
    pub async fn add_label_to_move(
        &self,
        move_id: RecordId,
        label_id: RecordId,
    ) -> Result<RecordId, StorageError> {
        self.blocking(move |db, _| {
            let txn = db.begin_write().engine("begin write")?;
            let id = {
                let moves = txn.open_table(MOVES).engine("open moves")?;
                if !exists(&moves, move_id)? {
                    return Err(StorageError::not_found("move", move_id));
                }
                let labels = txn.open_table(LABELS).engine("open labels")?;
                if !exists(&labels, label_id)? {
                    return Err(StorageError::not_found("label", label_id));
                }

                let mut by_pair = txn
                    .open_table(MOVE_LABELS_BY_PAIR)
                    .engine("open move_labels_by_pair")?;
                if by_pair
                    .get((move_id, label_id))
                    .engine("read move_labels_by_pair")?
                    .is_some()
                {
                    return Err(StorageError::constraint(
                        "This label is already attached to the move",
                    ));
                }

                let id = next_id(&txn, &MOVE_LABELS)?;
                let record = StoredMoveLabel {
                    id,
                    move_id,
                    label_id,
                };
                txn.open_table(MOVE_LABELS)
                    .engine("open move_labels")?
                    .insert(id, encode(&record)?.as_slice())
                    .engine("write move label")?;
                by_pair
                    .insert((move_id, label_id), id)
                    .engine("write move_labels_by_pair")?;
                id
            };
            txn.commit().engine("commit")?;

            debug!(id, move_id, label_id, "attached label");
            Ok(id)
        })
        .await
    }

    /// Labels attached to a move, ordered by label name.
    pub async fn get_labels_for_move(
        &self,
        move_id: RecordId,
    ) -> Result<Vec<MoveLabel>, StorageError> {
        self.blocking(move |db, _| {
            let read = db.begin_read().engine("begin read")?;
            let labels = read.open_table(LABELS).engine("open labels")?;
            let by_pair = read
                .open_table(MOVE_LABELS_BY_PAIR)
                .engine("open move_labels_by_pair")?;

            let mut result = Vec::new();
            for entry in by_pair
                .range((move_id, RecordId::MIN)..=(move_id, RecordId::MAX))
                .engine("scan move_labels_by_pair")?
            {
                let (key, association) = entry.engine("scan move_labels_by_pair")?;
                let (_, label_id) = key.value();
                if let Some(label) = load::<Label, _>(&labels, label_id)? {
                    result.push(MoveLabel {
                        id: label.id,
                        name: label.name,
                        move_label_id: association.value(),
                    });
                }
            }

            result.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            Ok(result)
        })
        .await
    }

    /// Detach a label by association id.
    pub async fn remove_label_from_move(&self, move_label_id: RecordId) -> Result<(), StorageError> {
        self.blocking(move |db, _| {
            let txn = db.begin_write().engine("begin write")?;
            {
                let mut move_labels = txn.open_table(MOVE_LABELS).engine("open move_labels")?;
                let record: StoredMoveLabel = load(&move_labels, move_label_id)?
                    .ok_or_else(|| StorageError::not_found("move label", move_label_id))?;
                move_labels
                    .remove(move_label_id)
                    .engine("delete move label")?;
                txn.open_table(MOVE_LABELS_BY_PAIR)
                    .engine("open move_labels_by_pair")?
                    .remove((record.move_id, record.label_id))
                    .engine("delete move_labels_by_pair")?;
            }
            txn.commit().engine("commit")?;

            debug!(move_label_id, "detached label");
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::storage::embedded::core::tests::test_store;

    #[tokio::test]
    async fn test_labels_sorted_and_unique() {
        let store = test_store().await;
        let strength = store.add_label("Strength").await.unwrap();
        let cardio = store.add_label("Cardio").await.unwrap();

        let names: Vec<_> = store
            .get_all_labels()
            .await
            .unwrap()
            .into_iter()
            .map(|l| (l.id, l.name))
            .collect();
        assert_eq!(
            names,
            vec![(cardio, "Cardio".to_string()), (strength, "Strength".to_string())]
        );

        let err = store.add_label("Strength").await.unwrap_err();
        assert!(matches!(err, StorageError::Constraint { .. }));
        assert_eq!(
            store.add_label("  ").await.unwrap_err(),
            StorageError::Validation(ValidationError::Empty {
                field: "Exercise name".into()
            })
        );
    }

    #[tokio::test]
    async fn test_attach_list_and_detach() {
        let store = test_store().await;
        let squat = store.add_move("Squat").await.unwrap();
        let legs = store.add_label("Legs").await.unwrap();
        let compound = store.add_label("Compound").await.unwrap();

        let ml_legs = store.add_label_to_move(squat, legs).await.unwrap();
        let ml_compound = store.add_label_to_move(squat, compound).await.unwrap();

        assert_eq!(
            store.get_labels_for_move(squat).await.unwrap(),
            vec![
                MoveLabel {
                    id: compound,
                    name: "Compound".into(),
                    move_label_id: ml_compound
                },
                MoveLabel {
                    id: legs,
                    name: "Legs".into(),
                    move_label_id: ml_legs
                },
            ]
        );

        let err = store.add_label_to_move(squat, legs).await.unwrap_err();
        assert_eq!(
            err,
            StorageError::constraint("This label is already attached to the move")
        );

        store.remove_label_from_move(ml_legs).await.unwrap();
        assert_eq!(store.get_labels_for_move(squat).await.unwrap().len(), 1);
        assert_eq!(
            store.remove_label_from_move(ml_legs).await.unwrap_err(),
            StorageError::not_found("move label", ml_legs)
        );

        // Detached pairs can be attached again.
        assert!(store.add_label_to_move(squat, legs).await.is_ok());
    }

    #[tokio::test]
    async fn test_attach_requires_both_sides() {
        let store = test_store().await;
        let squat = store.add_move("Squat").await.unwrap();
        let legs = store.add_label("Legs").await.unwrap();

        assert_eq!(
            store.add_label_to_move(9, legs).await.unwrap_err(),
            StorageError::not_found("move", 9)
        );
        assert_eq!(
            store.add_label_to_move(squat, 9).await.unwrap_err(),
            StorageError::not_found("label", 9)
        );
        assert!(store.get_labels_for_move(9).await.unwrap().is_empty());
    }
}
