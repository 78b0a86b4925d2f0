//! History storage operations.

#![allow(clippy::missing_errors_doc)]

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use super::core::RelationalStore;
use crate::error::StorageError;
use crate::traits::{HistoryEntry, RecordId};
use crate::validation::{check_reps, check_weight};

const HISTORY_SELECT: &str = "SELECT h.id, h.move_id, h.reps, h.kg, h.created, m.name AS move_name
     FROM history h JOIN moves m ON h.move_id = m.id";

impl RelationalStore {
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

        let live = self.live.read().await;
        let mut tx = live
            .pool
            .begin()
            .await
            .map_err(|e| Self::query_error("BEGIN", &e))?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM moves WHERE id = ?")
            .bind(move_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| Self::query_error("SELECT moves", &e))?;
        if exists.is_none() {
            return Err(StorageError::not_found("move", move_id));
        }

        let result =
            sqlx::query("INSERT INTO history (move_id, reps, kg, created) VALUES (?, ?, ?, ?)")
                .bind(move_id)
                .bind(reps)
                .bind(kg)
                .bind(created)
                .execute(&mut *tx)
                .await
                .map_err(|e| Self::query_error("INSERT history", &e))?;

        tx.commit()
            .await
            .map_err(|e| Self::query_error("COMMIT", &e))?;
        self.mirror(&live.pool).await;

        let id = result.last_insert_rowid();
        debug!(id, move_id, reps, kg, "added history entry");
        Ok(id)
    }

    /// All sets, oldest first.
    pub async fn get_all_history(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        let live = self.live.read().await;
        let rows = sqlx::query(&format!("{HISTORY_SELECT} ORDER BY h.created, h.id"))
            .fetch_all(&live.pool)
            .await
            .map_err(|e| Self::query_error("SELECT history", &e))?;

        rows.iter().map(Self::row_to_history).collect()
    }

    /// All sets of one move, oldest first.
    pub async fn get_history_by_move(
        &self,
        move_id: RecordId,
    ) -> Result<Vec<HistoryEntry>, StorageError> {
        let live = self.live.read().await;
        let rows = sqlx::query(&format!(
            "{HISTORY_SELECT} WHERE h.move_id = ? ORDER BY h.created, h.id"
        ))
        .bind(move_id)
        .fetch_all(&live.pool)
        .await
        .map_err(|e| Self::query_error("SELECT history", &e))?;

        rows.iter().map(Self::row_to_history).collect()
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

        let live = self.live.read().await;
        let result = sqlx::query("UPDATE history SET kg = ?, reps = ? WHERE id = ?")
            .bind(kg)
            .bind(reps)
            .bind(id)
            .execute(&live.pool)
            .await
            .map_err(|e| Self::query_error("UPDATE history", &e))?;
        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("history entry", id));
        }
        self.mirror(&live.pool).await;

        debug!(id, reps, kg, "updated history entry");
        Ok(())
    }

    /// Delete a set.
    pub async fn delete_history(&self, id: RecordId) -> Result<(), StorageError> {
        let live = self.live.read().await;
        let result = sqlx::query("DELETE FROM history WHERE id = ?")
            .bind(id)
            .execute(&live.pool)
            .await
            .map_err(|e| Self::query_error("DELETE history", &e))?;
        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("history entry", id));
        }
        self.mirror(&live.pool).await;

        debug!(id, "deleted history entry");
        Ok(())
    }

    /// Convert a database row to a `HistoryEntry`.
    fn row_to_history(row: &SqliteRow) -> Result<HistoryEntry, StorageError> {
        let decode = |e: sqlx::Error| Self::query_error("decode history", &e);
        let reps: i64 = row.try_get("reps").map_err(decode)?;

        Ok(HistoryEntry {
            id: row.try_get("id").map_err(decode)?,
            move_id: row.try_get("move_id").map_err(decode)?,
            reps: u32::try_from(reps).map_err(|_| StorageError::Internal {
                message: format!("stored reps out of range: {reps}"),
            })?,
            kg: row.try_get("kg").map_err(decode)?,
            created: row.try_get("created").map_err(decode)?,
            move_name: row.try_get("move_name").map_err(decode)?,
        })
    }
}
