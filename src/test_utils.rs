//! Test utilities and mock factories.
//!
//! This module provides shared testing infrastructure:
//! - Mock storage and clock factories
//! - Record fixtures
//!
//! Only compiled for tests (`#[cfg(test)]`).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::error::StorageError;
use crate::traits::{HistoryEntry, MockStorageTrait, MockTimeProvider, Move, RecordId};
use chrono::{DateTime, Utc};

/// Create a colored move fixture.
#[must_use]
pub fn test_move(id: RecordId, name: &str, hue: u16) -> Move {
    Move::new(id, name).with_color(crate::color::format_color(hue))
}

/// Create a history fixture.
#[must_use]
pub fn test_history(id: RecordId, owner: &Move, reps: u32, kg: f64, created: i64) -> HistoryEntry {
    HistoryEntry {
        id,
        move_id: owner.id,
        reps,
        kg,
        created,
        move_name: owner.name.clone(),
    }
}

/// Create a mock storage serving a fixed catalog.
///
/// `get_all_moves` honors the `active_only` flag; `get_all_history` returns
/// `history` as given.
///
/// # Example
///
/// ```ignore
/// let mock = mock_storage_with(vec![test_move(1, "Squat", 10)], vec![]);
/// let moves = mock.get_all_moves(false).await.unwrap();
/// ```
#[must_use]
pub fn mock_storage_with(moves: Vec<Move>, history: Vec<HistoryEntry>) -> MockStorageTrait {
    let mut mock = MockStorageTrait::new();
    mock.expect_get_all_moves().returning(move |active_only| {
        Ok(moves
            .iter()
            .filter(|m| !active_only || m.is_active)
            .cloned()
            .collect())
    });
    mock.expect_get_all_history()
        .returning(move || Ok(history.clone()));
    mock
}

/// Create a mock storage whose reads fail.
///
/// # Example
///
/// ```ignore
/// let mock = mock_storage_error(StorageError::Internal { message: "down".into() });
/// assert!(mock.get_all_moves(false).await.is_err());
/// ```
#[must_use]
pub fn mock_storage_error(error: StorageError) -> MockStorageTrait {
    let mut mock = MockStorageTrait::new();
    let error_clone = error.clone();
    mock.expect_get_all_moves()
        .returning(move |_| Err(error_clone.clone()));
    mock.expect_get_all_history()
        .returning(move || Err(error.clone()));
    mock
}

/// Create a mock time provider that returns a fixed timestamp.
///
/// # Example
///
/// ```ignore
/// let fixed_time = Utc::now();
/// let mock = mock_time(fixed_time);
/// assert_eq!(mock.now(), fixed_time);
/// ```
#[must_use]
pub fn mock_time(time: DateTime<Utc>) -> MockTimeProvider {
    let mut mock = MockTimeProvider::new();
    mock.expect_now().return_const(time);
    mock.expect_now_millis()
        .return_const(time.timestamp_millis());
    mock
}

/// Create a mock time provider from an ISO 8601 timestamp string.
///
/// # Panics
///
/// Panics if the timestamp string is invalid.
#[must_use]
pub fn mock_time_str(timestamp: &str) -> MockTimeProvider {
    let time = timestamp
        .parse::<DateTime<Utc>>()
        .expect("Invalid timestamp format");
    mock_time(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{StorageTrait, TimeProvider};

    #[test]
    fn test_mock_time_str() {
        let mock = mock_time_str("2024-01-15T12:00:00Z");
        assert_eq!(mock.now_millis(), 1_705_320_000_000);
        assert_eq!(mock.now().timestamp_millis(), 1_705_320_000_000);
    }

    #[tokio::test]
    async fn test_mock_storage_with_filters_inactive() {
        let mut resting = test_move(2, "Dips", 20);
        resting.is_active = false;
        let mock = mock_storage_with(vec![test_move(1, "Squat", 10), resting], vec![]);

        assert_eq!(mock.get_all_moves(false).await.unwrap().len(), 2);
        assert_eq!(mock.get_all_moves(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_storage_error() {
        let mock = mock_storage_error(StorageError::Internal {
            message: "down".into(),
        });
        assert!(mock.get_all_moves(false).await.is_err());
        assert!(mock.get_all_history().await.is_err());
    }
}
