//! Trait definitions for mockable dependencies.
//!
//! This module defines traits for:
//! - [`StorageTrait`]: The capability contract both backends implement
//! - [`TimeProvider`]: Time abstraction for testing
//!
//! It also re-exports the record types from the `types` submodule.
//!
//! # Mocking
//!
//! All traits are annotated with `#[cfg_attr(test, mockall::automock)]`
//! which generates mock implementations automatically for testing.
//!
//! # Example
//!
//! ```
//! use liftlog::traits::{RealTimeProvider, TimeProvider};
//!
//! let time_provider = RealTimeProvider;
//! assert!(time_provider.now_millis() > 0);
//! ```

mod types;

pub use types::{HistoryEntry, Label, Move, MoveLabel, MoveUpdate, RecordId};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StorageError;

/// Storage capability contract.
///
/// Both the embedded object store and the relational backend implement this
/// trait with identical semantics. Errors pass through unchanged:
/// invalid input is [`StorageError::Validation`], writes that reference a
/// missing row are [`StorageError::NotFound`], and uniqueness or relationship
/// violations are [`StorageError::Constraint`]. Reads of missing rows return
/// `None` or an empty list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageTrait: Send + Sync {
    /// Open the underlying store and apply pending migrations.
    ///
    /// Calling `init` on an up-to-date store is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InitFailed`] on engine failure.
    async fn init(&self) -> Result<(), StorageError>;

    /// Record a set and return its id. `created` is assigned by the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Validation`] for out-of-range values and
    /// [`StorageError::NotFound`] if the move does not exist.
    async fn add_history(
        &self,
        reps: i64,
        kg: f64,
        move_id: RecordId,
    ) -> Result<RecordId, StorageError>;

    /// All sets, oldest first, each carrying its move's current name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the read fails.
    async fn get_all_history(&self) -> Result<Vec<HistoryEntry>, StorageError>;

    /// Change the weight and reps of a set.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Validation`] or [`StorageError::NotFound`].
    async fn update_history(&self, id: RecordId, kg: f64, reps: i64) -> Result<(), StorageError>;

    /// Delete a set.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the set does not exist.
    async fn delete_history(&self, id: RecordId) -> Result<(), StorageError>;

    /// All sets of one move, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the read fails.
    async fn get_history_by_move(
        &self,
        move_id: RecordId,
    ) -> Result<Vec<HistoryEntry>, StorageError>;

    /// Create an active move with a freshly allocated color.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Validation`], [`StorageError::Constraint`] for a
    /// duplicate name, or [`StorageError::ColorExhausted`].
    async fn add_move(&self, name: &str) -> Result<RecordId, StorageError>;

    /// Look up a move.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the read fails.
    async fn get_move_by_id(&self, id: RecordId) -> Result<Option<Move>, StorageError>;

    /// All moves ordered by name, optionally only the active ones.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the read fails.
    async fn get_all_moves(&self, active_only: bool) -> Result<Vec<Move>, StorageError>;

    /// Overwrite the editable fields of a move.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`], [`StorageError::Validation`], or
    /// [`StorageError::Constraint`] if the name or color belongs to another
    /// move.
    async fn update_move(&self, id: RecordId, update: &MoveUpdate) -> Result<(), StorageError>;

    /// Delete a move and its label associations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Constraint`] if any set references the move.
    async fn delete_move(&self, id: RecordId) -> Result<(), StorageError>;

    /// Create a label.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Validation`] or [`StorageError::Constraint`].
    async fn add_label(&self, name: &str) -> Result<RecordId, StorageError>;

    /// All labels ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the read fails.
    async fn get_all_labels(&self) -> Result<Vec<Label>, StorageError>;

    /// Attach a label to a move and return the association id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] for a missing move or label and
    /// [`StorageError::Constraint`] if the pair already exists.
    async fn add_label_to_move(
        &self,
        move_id: RecordId,
        label_id: RecordId,
    ) -> Result<RecordId, StorageError>;

    /// Labels attached to a move, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the read fails.
    async fn get_labels_for_move(&self, move_id: RecordId)
        -> Result<Vec<MoveLabel>, StorageError>;

    /// Detach a label by association id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the association does not exist.
    async fn remove_label_from_move(&self, move_label_id: RecordId) -> Result<(), StorageError>;

    /// Draw a color not used by any stored move.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ColorExhausted`] after the attempt bound.
    async fn generate_unique_color(&self) -> Result<String, StorageError>;
}

/// Time provider trait for deterministic testing.
///
/// This trait abstracts time operations to allow for
/// deterministic testing by providing fixed timestamps.
#[cfg_attr(test, mockall::automock)]
pub trait TimeProvider: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Real time provider using system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
