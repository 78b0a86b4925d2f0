//! Move storage operations.

#![allow(clippy::missing_errors_doc)]

use std::collections::HashSet;

use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use tracing::debug;

use super::core::RelationalStore;
use crate::error::{StorageError, ValidationError};
use crate::traits::{Move, MoveUpdate, RecordId};
use crate::validation::validate_exercise_name;

impl RelationalStore {
    /// Create an active move with a freshly allocated color.
    pub async fn add_move(&self, name: &str) -> Result<RecordId, StorageError> {
        let name = validate_exercise_name(name)?;
        let live = self.live.read().await;
        let mut tx = live
            .pool
            .begin()
            .await
            .map_err(|e| Self::query_error("BEGIN", &e))?;

        if Self::name_taken(&mut tx, &name, None).await? {
            return Err(StorageError::constraint(format!(
                "A move named '{name}' already exists"
            )));
        }
        let taken = Self::taken_colors(&mut tx).await?;
        let color = self
            .context
            .allocator
            .allocate(|candidate| Ok(taken.contains(candidate)))?;

        let result = sqlx::query(
            "INSERT INTO moves (name, description, youtube_link, is_active, color)
             VALUES (?, '', '', 1, ?)",
        )
        .bind(&name)
        .bind(&color)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::query_error("INSERT moves", &e))?;

        tx.commit()
            .await
            .map_err(|e| Self::query_error("COMMIT", &e))?;
        self.mirror(&live.pool).await;

        let id = result.last_insert_rowid();
        debug!(id, name = %name, color = %color, "added move");
        Ok(id)
    }

    /// Get a move by ID.
    pub async fn get_move_by_id(&self, id: RecordId) -> Result<Option<Move>, StorageError> {
        let live = self.live.read().await;
        let row = sqlx::query(
            "SELECT id, name, description, youtube_link, is_active, color
             FROM moves WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&live.pool)
        .await
        .map_err(|e| Self::query_error("SELECT moves", &e))?;

        row.as_ref().map(Self::row_to_move).transpose()
    }

    /// Get all moves ordered by name.
    pub async fn get_all_moves(&self, active_only: bool) -> Result<Vec<Move>, StorageError> {
        let live = self.live.read().await;
        let query = if active_only {
            "SELECT id, name, description, youtube_link, is_active, color
             FROM moves WHERE is_active = 1 ORDER BY name"
        } else {
            "SELECT id, name, description, youtube_link, is_active, color
             FROM moves ORDER BY name"
        };
        let rows = sqlx::query(query)
            .fetch_all(&live.pool)
            .await
            .map_err(|e| Self::query_error("SELECT moves", &e))?;

        rows.iter().map(Self::row_to_move).collect()
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

        let live = self.live.read().await;
        let mut tx = live
            .pool
            .begin()
            .await
            .map_err(|e| Self::query_error("BEGIN", &e))?;

        let current: Option<Option<String>> =
            sqlx::query_scalar("SELECT color FROM moves WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| Self::query_error("SELECT moves", &e))?;
        let Some(current_color) = current else {
            return Err(StorageError::not_found("move", id));
        };

        if Self::name_taken(&mut tx, &name, Some(id)).await? {
            return Err(StorageError::constraint(format!(
                "A move named '{name}' already exists"
            )));
        }
        if let Some(color) = &color {
            if current_color.as_ref() != Some(color) && Self::color_taken(&mut tx, color, id).await?
            {
                return Err(StorageError::constraint(
                    "This color is already in use by another exercise",
                ));
            }
        }

        sqlx::query(
            "UPDATE moves
             SET name = ?, description = ?, youtube_link = ?, is_active = ?,
                 color = COALESCE(?, color)
             WHERE id = ?",
        )
        .bind(&name)
        .bind(&update.description)
        .bind(&update.youtube_link)
        .bind(update.is_active)
        .bind(&color)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::query_error("UPDATE moves", &e))?;

        tx.commit()
            .await
            .map_err(|e| Self::query_error("COMMIT", &e))?;
        self.mirror(&live.pool).await;

        debug!(id, name = %name, "updated move");
        Ok(())
    }

    /// Delete a move with no history, along with its label associations.
    pub async fn delete_move(&self, id: RecordId) -> Result<(), StorageError> {
        let live = self.live.read().await;
        let mut tx = live
            .pool
            .begin()
            .await
            .map_err(|e| Self::query_error("BEGIN", &e))?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM moves WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| Self::query_error("SELECT moves", &e))?;
        if exists.is_none() {
            return Err(StorageError::not_found("move", id));
        }

        let sets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM history WHERE move_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| Self::query_error("SELECT history", &e))?;
        if sets > 0 {
            return Err(StorageError::constraint(format!(
                "Cannot delete a move with history ({sets} sets recorded)"
            )));
        }

        sqlx::query("DELETE FROM move_labels WHERE move_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Self::query_error("DELETE move_labels", &e))?;
        sqlx::query("DELETE FROM moves WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Self::query_error("DELETE moves", &e))?;

        tx.commit()
            .await
            .map_err(|e| Self::query_error("COMMIT", &e))?;
        self.mirror(&live.pool).await;

        debug!(id, "deleted move");
        Ok(())
    }

    /// Draw a color not used by any stored move.
    pub async fn generate_unique_color(&self) -> Result<String, StorageError> {
        let live = self.live.read().await;
        let mut conn = live
            .pool
            .acquire()
            .await
            .map_err(|e| Self::query_error("ACQUIRE", &e))?;
        let taken = Self::taken_colors(&mut conn).await?;
        self.context
            .allocator
            .allocate(|candidate| Ok(taken.contains(candidate)))
    }

    async fn name_taken(
        conn: &mut SqliteConnection,
        name: &str,
        except: Option<RecordId>,
    ) -> Result<bool, StorageError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM moves WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| Self::query_error("SELECT moves", &e))?;
        Ok(found.is_some_and(|id| Some(id) != except))
    }

    async fn color_taken(
        conn: &mut SqliteConnection,
        color: &str,
        except: RecordId,
    ) -> Result<bool, StorageError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM moves WHERE color = ? AND id != ?")
                .bind(color)
                .bind(except)
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| Self::query_error("SELECT moves", &e))?;
        Ok(found.is_some())
    }

    async fn taken_colors(conn: &mut SqliteConnection) -> Result<HashSet<String>, StorageError> {
        let colors: Vec<String> =
            sqlx::query_scalar("SELECT color FROM moves WHERE color IS NOT NULL")
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| Self::query_error("SELECT moves", &e))?;
        Ok(colors.into_iter().collect())
    }

    /// Convert a database row to a `Move`.
    fn row_to_move(row: &SqliteRow) -> Result<Move, StorageError> {
        let decode = |e: sqlx::Error| Self::query_error("decode moves", &e);
        let description: Option<String> = row.try_get("description").map_err(decode)?;
        let youtube_link: Option<String> = row.try_get("youtube_link").map_err(decode)?;

        Ok(Move {
            id: row.try_get("id").map_err(decode)?,
            name: row.try_get("name").map_err(decode)?,
            description: description.unwrap_or_default(),
            youtube_link: youtube_link.unwrap_or_default(),
            is_active: row.try_get("is_active").map_err(decode)?,
            color: row.try_get("color").map_err(decode)?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::storage::relational::core::tests::{cycling_context, test_store};
    use crate::storage::{RelationalStore, SessionImage};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_add_move_assigns_unique_colors() {
        let store = test_store().await;
        let a = store.add_move("Squat").await.unwrap();
        let b = store.add_move("Bench").await.unwrap();

        let a = store.get_move_by_id(a).await.unwrap().unwrap();
        let b = store.get_move_by_id(b).await.unwrap().unwrap();
        assert!(a.color.as_deref().unwrap().starts_with("hsl("));
        assert_ne!(a.color, b.color);
        assert!(a.is_active);
        assert_eq!(a.description, "");
    }

    #[tokio::test]
    async fn test_add_move_trims_and_rejects_duplicates() {
        let store = test_store().await;
        let id = store.add_move("  Squat ").await.unwrap();
        assert_eq!(store.get_move_by_id(id).await.unwrap().unwrap().name, "Squat");

        let err = store.add_move("Squat").await.unwrap_err();
        assert!(matches!(err, StorageError::Constraint { .. }));
    }

    #[tokio::test]
    async fn test_add_move_rejects_invalid_name() {
        let store = test_store().await;
        let err = store.add_move("Squat!").await.unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
        assert!(store.get_all_moves(false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_move_color_exhaustion() {
        let context = cycling_context(vec![90]);
        let store = RelationalStore::open(context, SessionImage::new(), None)
            .await
            .unwrap();
        store.add_move("First").await.unwrap();

        let err = store.add_move("Second").await.unwrap_err();
        assert_eq!(err, StorageError::ColorExhausted { attempts: 50 });
        assert_eq!(store.get_all_moves(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_all_moves_filters_and_orders() {
        let store = test_store().await;
        store.add_move("Squat").await.unwrap();
        let bench = store.add_move("Bench").await.unwrap();
        store.add_move("Row").await.unwrap();
        store
            .update_move(bench, &MoveUpdate::new("Bench").with_active(false))
            .await
            .unwrap();

        let all: Vec<_> = store
            .get_all_moves(false)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(all, vec!["Bench", "Row", "Squat"]);

        let active: Vec<_> = store
            .get_all_moves(true)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(active, vec!["Row", "Squat"]);
    }

    #[tokio::test]
    async fn test_update_move_fields_and_keep_color() {
        let store = test_store().await;
        let id = store.add_move("Squat").await.unwrap();
        let before = store.get_move_by_id(id).await.unwrap().unwrap();

        let update = MoveUpdate::new("Back Squat")
            .with_description("high bar")
            .with_youtube_link("https://youtu.be/abc");
        store.update_move(id, &update).await.unwrap();

        let after = store.get_move_by_id(id).await.unwrap().unwrap();
        assert_eq!(after.name, "Back Squat");
        assert_eq!(after.description, "high bar");
        assert_eq!(after.youtube_link, "https://youtu.be/abc");
        assert_eq!(after.color, before.color);
    }

    #[tokio::test]
    async fn test_update_move_rejects_foreign_color() {
        let store = test_store().await;
        let a = store.add_move("Squat").await.unwrap();
        let b = store.add_move("Bench").await.unwrap();
        let a_color = store.get_move_by_id(a).await.unwrap().unwrap().color.unwrap();
        let b_before = store.get_move_by_id(b).await.unwrap().unwrap();

        let err = store
            .update_move(b, &MoveUpdate::new("Bench").with_color(&a_color))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Constraint { .. }));
        assert_eq!(store.get_move_by_id(b).await.unwrap().unwrap(), b_before);
    }

    #[tokio::test]
    async fn test_update_move_accepts_own_and_fresh_color() {
        let store = test_store().await;
        let id = store.add_move("Squat").await.unwrap();
        let own = store.get_move_by_id(id).await.unwrap().unwrap().color.unwrap();
        store
            .update_move(id, &MoveUpdate::new("Squat").with_color(&own))
            .await
            .unwrap();

        let fresh = store.generate_unique_color().await.unwrap();
        assert_ne!(fresh, own);
        store
            .update_move(id, &MoveUpdate::new("Squat").with_color(&fresh))
            .await
            .unwrap();
        assert_eq!(
            store.get_move_by_id(id).await.unwrap().unwrap().color,
            Some(fresh)
        );
    }

    #[tokio::test]
    async fn test_update_move_errors() {
        let store = test_store().await;
        let a = store.add_move("Squat").await.unwrap();
        store.add_move("Bench").await.unwrap();

        let err = store.update_move(99, &MoveUpdate::new("Dip")).await.unwrap_err();
        assert_eq!(err, StorageError::not_found("move", 99));

        let err = store
            .update_move(a, &MoveUpdate::new("Bench"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Constraint { .. }));

        let err = store
            .update_move(a, &MoveUpdate::new("Squat").with_color(" "))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_move_cascades_labels() {
        let store = test_store().await;
        let id = store.add_move("Squat").await.unwrap();
        let label = store.add_label("Legs").await.unwrap();
        store.add_label_to_move(id, label).await.unwrap();

        store.delete_move(id).await.unwrap();

        assert!(store.get_move_by_id(id).await.unwrap().is_none());
        assert!(store.get_labels_for_move(id).await.unwrap().is_empty());
        assert_eq!(store.get_all_labels().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_move_with_history_is_rejected() {
        let store = test_store().await;
        let id = store.add_move("Squat").await.unwrap();
        store.add_history(5, 100.0, id).await.unwrap();
        let label = store.add_label("Legs").await.unwrap();
        store.add_label_to_move(id, label).await.unwrap();

        let err = store.delete_move(id).await.unwrap_err();
        assert!(matches!(err, StorageError::Constraint { .. }));
        assert!(store.get_move_by_id(id).await.unwrap().is_some());
        assert_eq!(store.get_history_by_move(id).await.unwrap().len(), 1);
        assert_eq!(store.get_labels_for_move(id).await.unwrap().len(), 1);

        let err = store.delete_move(42).await.unwrap_err();
        assert_eq!(err, StorageError::not_found("move", 42));
    }
}
