//! Label storage operations.

#![allow(clippy::missing_errors_doc)]

use sqlx::Row;
use tracing::debug;

use super::core::RelationalStore;
use crate::error::StorageError;
use crate::traits::{Label, MoveLabel, RecordId};
use crate::validation::validate_exercise_name;

impl RelationalStore {
    /// Create a label.
    pub async fn add_label(&self, name: &str) -> Result<RecordId, StorageError> {
        let name = validate_exercise_name(name)?;
        let live = self.live.read().await;
        let mut tx = live
            .pool
            .begin()
            .await
            .map_err(|e| Self::query_error("BEGIN", &e))?;

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM labels WHERE name = ?")
            .bind(&name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| Self::query_error("SELECT labels", &e))?;
        if existing.is_some() {
            return Err(StorageError::constraint(format!(
                "A label named '{name}' already exists"
            )));
        }

        let result = sqlx::query("INSERT INTO labels (name) VALUES (?)")
            .bind(&name)
            .execute(&mut *tx)
            .await
            .map_err(|e| Self::query_error("INSERT labels", &e))?;

        tx.commit()
            .await
            .map_err(|e| Self::query_error("COMMIT", &e))?;
        self.mirror(&live.pool).await;

        let id = result.last_insert_rowid();
        debug!(id, name = %name, "added label");
        Ok(id)
    }

    /// All labels ordered by name.
    pub async fn get_all_labels(&self) -> Result<Vec<Label>, StorageError> {
        let live = self.live.read().await;
        let rows = sqlx::query("SELECT id, name FROM labels ORDER BY name")
            .fetch_all(&live.pool)
            .await
            .map_err(|e| Self::query_error("SELECT labels", &e))?;

        rows.iter()
            .map(|row| -> Result<Label, StorageError> {
                let decode = |e: sqlx::Error| Self::query_error("decode labels", &e);
                Ok(Label::new(
                    row.try_get("id").map_err(decode)?,
                    row.try_get::<String, _>("name").map_err(decode)?,
                ))
            })
            .collect()
    }

    /// Attach a label to a move.
    pub async fn add_label_to_move(
        &self,
        move_id: RecordId,
        label_id: RecordId,
    ) -> Result<RecordId, StorageError> {
        let live = self.live.read().await;
        let mut tx = live
            .pool
            .begin()
            .await
            .map_err(|e| Self::query_error("BEGIN", &e))?;

        let move_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM moves WHERE id = ?")
            .bind(move_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| Self::query_error("SELECT moves", &e))?;
        if move_exists.is_none() {
            return Err(StorageError::not_found("move", move_id));
        }

        let label_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM labels WHERE id = ?")
            .bind(label_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| Self::query_error("SELECT labels", &e))?;
        if label_exists.is_none() {
            return Err(StorageError::not_found("label", label_id));
        }

        let attached: Option<i64> =
            sqlx::query_scalar("SELECT id FROM move_labels WHERE move_id = ? AND label_id = ?")
                .bind(move_id)
                .bind(label_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| Self::query_error("SELECT move_labels", &e))?;
        if attached.is_some() {
            return Err(StorageError::constraint(
                "This label is already attached to the move",
            ));
        }

        let result = sqlx::query("INSERT INTO move_labels (move_id, label_id) VALUES (?, ?)")
            .bind(move_id)
            .bind(label_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Self::query_error("INSERT move_labels", &e))?;

        tx.commit()
            .await
            .map_err(|e| Self::query_error("COMMIT", &e))?;
        self.mirror(&live.pool).await;

        let id = result.last_insert_rowid();
        debug!(id, move_id, label_id, "attached label");
        Ok(id)
    }

    /// Labels attached to a move, ordered by name.
    pub async fn get_labels_for_move(
        &self,
        move_id: RecordId,
    ) -> Result<Vec<MoveLabel>, StorageError> {
        let live = self.live.read().await;
        let rows = sqlx::query(
            "SELECT l.id, l.name, ml.id AS move_label_id
             FROM labels l JOIN move_labels ml ON l.id = ml.label_id
             WHERE ml.move_id = ?
             ORDER BY l.name",
        )
        .bind(move_id)
        .fetch_all(&live.pool)
        .await
        .map_err(|e| Self::query_error("SELECT move_labels", &e))?;

        rows.iter()
            .map(|row| -> Result<MoveLabel, StorageError> {
                let decode = |e: sqlx::Error| Self::query_error("decode move_labels", &e);
                Ok(MoveLabel {
                    id: row.try_get("id").map_err(decode)?,
                    name: row.try_get("name").map_err(decode)?,
                    move_label_id: row.try_get("move_label_id").map_err(decode)?,
                })
            })
            .collect()
    }

    /// Detach a label by association id.
    pub async fn remove_label_from_move(&self, move_label_id: RecordId) -> Result<(), StorageError> {
        let live = self.live.read().await;
        let result = sqlx::query("DELETE FROM move_labels WHERE id = ?")
            .bind(move_label_id)
            .execute(&live.pool)
            .await
            .map_err(|e| Self::query_error("DELETE move_labels", &e))?;
        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("move label", move_label_id));
        }
        self.mirror(&live.pool).await;

        debug!(move_label_id, "detached label");
        Ok(())
    }
}
