//! Relational schema migrations.
//!
//! Migration 001 creates the base tables and is idempotent. Migration 002
//! adds the move color column; it runs only when the column is missing and
//! shares one transaction with the color back-fill, so a failure anywhere
//! leaves the database as it was.

#![allow(clippy::missing_errors_doc)]

use std::collections::HashSet;

use sqlx::sqlite::{SqliteConnection, SqlitePool};
use tracing::info;

use super::core::BACKEND;
use crate::color::ColorAllocator;
use crate::error::StorageError;

const ENSURE_COLOR_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_moves_color ON moves(color) WHERE color IS NOT NULL";

fn migration_error(version: &str, err: &sqlx::Error) -> StorageError {
    StorageError::InitFailed {
        backend: BACKEND.to_string(),
        message: format!("migration {version} failed: {err}"),
    }
}

/// Run database migrations.
pub(crate) async fn run_migrations(
    pool: &SqlitePool,
    allocator: &ColorAllocator,
) -> Result<(), StorageError> {
    // Migration 001: Initial schema
    let schema_001 = include_str!("../../../migrations/001_initial_schema.sql");
    sqlx::query(schema_001)
        .execute(pool)
        .await
        .map_err(|e| migration_error("001", &e))?;

    // Migration 002: Move colors, with back-fill
    let mut tx = pool.begin().await.map_err(|e| migration_error("002", &e))?;

    if !has_color_column(&mut tx).await? {
        let schema_002 = include_str!("../../../migrations/002_move_colors.sql");
        sqlx::query(schema_002)
            .execute(&mut *tx)
            .await
            .map_err(|e| migration_error("002", &e))?;
        info!("added color column to moves");
    }
    sqlx::query(ENSURE_COLOR_INDEX)
        .execute(&mut *tx)
        .await
        .map_err(|e| migration_error("002", &e))?;

    let filled = backfill_colors(&mut tx, allocator).await?;
    tx.commit().await.map_err(|e| migration_error("002", &e))?;

    if filled > 0 {
        info!(moves = filled, "back-filled move colors");
    }
    Ok(())
}

async fn has_color_column(conn: &mut SqliteConnection) -> Result<bool, StorageError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info('moves') WHERE name = 'color'")
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| migration_error("002", &e))?;
    Ok(count > 0)
}

/// Assign a color to every move that lacks one. Returns the number filled.
async fn backfill_colors(
    conn: &mut SqliteConnection,
    allocator: &ColorAllocator,
) -> Result<usize, StorageError> {
    let colorless: Vec<i64> =
        sqlx::query_scalar("SELECT id FROM moves WHERE color IS NULL ORDER BY id")
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| migration_error("002", &e))?;
    if colorless.is_empty() {
        return Ok(0);
    }

    let mut taken: HashSet<String> =
        sqlx::query_scalar("SELECT color FROM moves WHERE color IS NOT NULL")
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| migration_error("002", &e))?
            .into_iter()
            .collect();

    for id in &colorless {
        let color = allocator.allocate(|candidate| Ok(taken.contains(candidate)))?;
        sqlx::query("UPDATE moves SET color = ? WHERE id = ?")
            .bind(&color)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| migration_error("002", &e))?;
        taken.insert(color);
    }

    Ok(colorless.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::color::CycleHueSource;
    use crate::storage::relational::core::Scratch;

    async fn legacy_database() -> Scratch {
        let scratch = Scratch::create(None).await.unwrap();
        sqlx::query(include_str!("../../../migrations/001_initial_schema.sql"))
            .execute(&scratch.pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO moves (name) VALUES ('Squat'), ('Bench'), ('Row')")
            .execute(&scratch.pool)
            .await
            .unwrap();
        scratch
    }

    async fn colors(pool: &SqlitePool) -> Vec<Option<String>> {
        sqlx::query_scalar("SELECT color FROM moves ORDER BY id")
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_upgrade_adds_color_and_backfills() {
        let scratch = legacy_database().await;
        let allocator = ColorAllocator::new(Arc::new(CycleHueSource::new(vec![10, 20, 30])));

        run_migrations(&scratch.pool, &allocator).await.unwrap();

        assert_eq!(
            colors(&scratch.pool).await,
            vec![
                Some("hsl(10, 70%, 50%)".to_string()),
                Some("hsl(20, 70%, 50%)".to_string()),
                Some("hsl(30, 70%, 50%)".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_backfill_skips_taken_colors() {
        let scratch = legacy_database().await;
        let allocator = ColorAllocator::new(Arc::new(CycleHueSource::new(vec![10, 10, 20, 30])));

        run_migrations(&scratch.pool, &allocator).await.unwrap();

        let assigned: HashSet<_> = colors(&scratch.pool).await.into_iter().collect();
        assert_eq!(assigned.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_backfill_rolls_back_column() {
        let scratch = legacy_database().await;
        let allocator =
            ColorAllocator::new(Arc::new(CycleHueSource::new(vec![10]))).with_max_attempts(2);

        let err = run_migrations(&scratch.pool, &allocator).await.unwrap_err();
        assert_eq!(err, StorageError::ColorExhausted { attempts: 2 });

        let mut conn = scratch.pool.acquire().await.unwrap();
        assert!(!has_color_column(&mut conn).await.unwrap());
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let scratch = legacy_database().await;
        let allocator = ColorAllocator::default();

        run_migrations(&scratch.pool, &allocator).await.unwrap();
        let first = colors(&scratch.pool).await;
        run_migrations(&scratch.pool, &allocator).await.unwrap();

        assert_eq!(colors(&scratch.pool).await, first);
    }

    #[tokio::test]
    async fn test_backfill_runs_on_current_schema() {
        let scratch = legacy_database().await;
        let allocator = ColorAllocator::default();
        run_migrations(&scratch.pool, &allocator).await.unwrap();

        sqlx::query("INSERT INTO moves (name) VALUES ('Dip')")
            .execute(&scratch.pool)
            .await
            .unwrap();
        run_migrations(&scratch.pool, &allocator).await.unwrap();

        assert!(colors(&scratch.pool).await.iter().all(Option::is_some));
    }
}
