//! Database image export, import and schema validation.

#![allow(clippy::missing_errors_doc)]

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::{info, warn};

use super::core::{internal, RelationalStore, Scratch};
use super::migrations;
use crate::error::StorageError;

/// User tables an importable image must contain, in name order.
const REQUIRED_TABLES: [&str; 4] = ["history", "labels", "move_labels", "moves"];

pub(crate) fn rejected(message: impl Into<String>) -> StorageError {
    StorageError::SchemaValidation {
        message: message.into(),
    }
}

pub(crate) fn rejected_from(err: StorageError) -> StorageError {
    rejected(err.to_string())
}

/// Serialize the whole database into `SQLite` file format.
pub(crate) async fn snapshot(pool: &SqlitePool) -> Result<Vec<u8>, StorageError> {
    let dir = tempfile::tempdir()
        .map_err(|e| internal(format!("Failed to create export directory: {e}")))?;
    let target = dir.path().join("export.db");

    sqlx::query("VACUUM INTO ?")
        .bind(target.to_string_lossy().into_owned())
        .execute(pool)
        .await
        .map_err(|e| RelationalStore::query_error("VACUUM INTO", &e))?;

    std::fs::read(&target).map_err(|e| internal(format!("Failed to read exported image: {e}")))
}

/// Check that an opened image has the schema this backend writes.
pub(crate) async fn validate_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| rejected(format!("not a readable SQLite database: {e}")))?;

    if tables != REQUIRED_TABLES {
        return Err(rejected(format!(
            "expected tables {REQUIRED_TABLES:?}, found {tables:?}"
        )));
    }

    let columns = sqlx::query("SELECT name, \"notnull\" FROM pragma_table_info('moves')")
        .fetch_all(pool)
        .await
        .map_err(|e| rejected(format!("cannot inspect moves: {e}")))?;

    let mut name_required = false;
    let mut has_color = false;
    for row in &columns {
        let column: String = row
            .try_get("name")
            .map_err(|e| rejected(format!("cannot inspect moves: {e}")))?;
        let not_null: i64 = row
            .try_get("notnull")
            .map_err(|e| rejected(format!("cannot inspect moves: {e}")))?;
        match column.as_str() {
            "name" => name_required = not_null == 1,
            "color" => has_color = true,
            _ => {}
        }
    }
    if !name_required {
        return Err(rejected("moves.name must be a NOT NULL column"));
    }
    if !has_color {
        return Err(rejected("moves has no color column"));
    }

    let foreign_keys: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_foreign_key_list('history')")
            .fetch_one(pool)
            .await
            .map_err(|e| rejected(format!("cannot inspect history: {e}")))?;
    if foreign_keys == 0 {
        return Err(rejected("history declares no foreign key"));
    }

    Ok(())
}

impl RelationalStore {
    /// Serialize the current database.
    ///
    /// The bytes are a complete `SQLite` file and re-import with full
    /// fidelity.
    pub async fn export_image(&self) -> Result<Vec<u8>, StorageError> {
        let live = self.live.read().await;
        let bytes = snapshot(&live.pool).await?;
        info!(bytes = bytes.len(), "exported database image");
        Ok(bytes)
    }

    /// Replace the database with an imported image.
    ///
    /// The image is validated and migrated on a fresh scratch database
    /// before it replaces the active one. On any failure the active database
    /// is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::SchemaValidation`] if the image is not a
    /// database with the expected schema.
    pub async fn import_image(&self, image: &[u8]) -> Result<(), StorageError> {
        let incoming = Scratch::create(Some(image)).await.map_err(rejected_from)?;

        if let Err(e) = validate_schema(&incoming.pool).await {
            warn!(error = %e, "rejected database image");
            incoming.pool.close().await;
            return Err(e);
        }
        migrations::run_migrations(&incoming.pool, &self.context.allocator).await?;

        let mut live = self.live.write().await;
        let previous = std::mem::replace(&mut *live, incoming);
        let live = live.downgrade();
        previous.pool.close().await;

        self.mirror(&live.pool).await;
        info!(bytes = image.len(), "imported database image");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::storage::relational::core::tests::test_store;
    use pretty_assertions::assert_eq;

    async fn image_from(sql: &str) -> Vec<u8> {
        let scratch = Scratch::create(None).await.unwrap();
        sqlx::query(sql).execute(&scratch.pool).await.unwrap();
        snapshot(&scratch.pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let source = test_store().await;
        let squat = source.add_move("Squat").await.unwrap();
        source.add_history(5, 100.0, squat).await.unwrap();
        let legs = source.add_label("Legs").await.unwrap();
        source.add_label_to_move(squat, legs).await.unwrap();

        let image = source.export_image().await.unwrap();
        assert!(image.starts_with(b"SQLite format 3\0"));

        let target = test_store().await;
        target.add_move("Something else").await.unwrap();
        target.import_image(&image).await.unwrap();

        assert_eq!(
            target.get_all_moves(false).await.unwrap(),
            source.get_all_moves(false).await.unwrap()
        );
        assert_eq!(
            target.get_all_history().await.unwrap(),
            source.get_all_history().await.unwrap()
        );
        assert_eq!(
            target.get_all_labels().await.unwrap(),
            source.get_all_labels().await.unwrap()
        );
        assert_eq!(
            target.get_labels_for_move(squat).await.unwrap(),
            source.get_labels_for_move(squat).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_import_rejects_garbage() {
        let store = test_store().await;
        let id = store.add_move("Deadlift").await.unwrap();

        let err = store.import_image(b"definitely not sqlite").await.unwrap_err();
        assert!(matches!(err, StorageError::SchemaValidation { .. }));
        assert!(store.get_move_by_id(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_import_rejects_extra_table() {
        let store = test_store().await;
        let scratch = Scratch::create(None).await.unwrap();
        migrations::run_migrations(&scratch.pool, &store.context.allocator)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE extra (id INTEGER)")
            .execute(&scratch.pool)
            .await
            .unwrap();
        let image = snapshot(&scratch.pool).await.unwrap();

        let err = store.import_image(&image).await.unwrap_err();
        assert!(err.to_string().contains("expected tables"));
    }

    #[tokio::test]
    async fn test_import_rejects_nullable_name() {
        let image = image_from(
            "CREATE TABLE moves (id INTEGER PRIMARY KEY, name TEXT, color TEXT);
             CREATE TABLE history (id INTEGER PRIMARY KEY, move_id INTEGER REFERENCES moves(id));
             CREATE TABLE labels (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE move_labels (id INTEGER PRIMARY KEY);",
        )
        .await;

        let err = test_store().await.import_image(&image).await.unwrap_err();
        assert_eq!(
            err,
            StorageError::SchemaValidation {
                message: "moves.name must be a NOT NULL column".into()
            }
        );
    }

    #[tokio::test]
    async fn test_import_rejects_missing_color() {
        let image = image_from(
            "CREATE TABLE moves (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
             CREATE TABLE history (id INTEGER PRIMARY KEY, move_id INTEGER REFERENCES moves(id));
             CREATE TABLE labels (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE move_labels (id INTEGER PRIMARY KEY);",
        )
        .await;

        let err = test_store().await.import_image(&image).await.unwrap_err();
        assert!(err.to_string().contains("no color column"));
    }

    #[tokio::test]
    async fn test_import_rejects_history_without_foreign_key() {
        let image = image_from(
            "CREATE TABLE moves (id INTEGER PRIMARY KEY, name TEXT NOT NULL, color TEXT);
             CREATE TABLE history (id INTEGER PRIMARY KEY, move_id INTEGER);
             CREATE TABLE labels (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE move_labels (id INTEGER PRIMARY KEY);",
        )
        .await;

        let err = test_store().await.import_image(&image).await.unwrap_err();
        assert!(err.to_string().contains("foreign key"));
    }
}
