//! Read-through move cache.
//!
//! Presentation code looks moves up by id far more often than it changes
//! them. [`MoveCache`] keeps the whole catalog, active and inactive, keyed by
//! id. It is owned by the caller and only changes on [`MoveCache::reload`],
//! so call that after every write that touches moves.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::StorageError;
use crate::traits::{Move, RecordId, StorageTrait};

/// Placeholder name for ids missing from the cache.
pub const UNKNOWN_MOVE: &str = "Unknown";

/// Snapshot of every move, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MoveCache {
    moves: BTreeMap<RecordId, Move>,
}

impl MoveCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache from the current catalog.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the catalog cannot be read.
    pub async fn load(storage: &dyn StorageTrait) -> Result<Self, StorageError> {
        let mut cache = Self::new();
        cache.reload(storage).await?;
        Ok(cache)
    }

    /// Replace the contents with the current catalog. Returns the number of
    /// moves cached.
    ///
    /// On error the previous contents are kept.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the catalog cannot be read.
    pub async fn reload(&mut self, storage: &dyn StorageTrait) -> Result<usize, StorageError> {
        let moves = storage.get_all_moves(false).await?;
        self.moves = moves.into_iter().map(|m| (m.id, m)).collect();
        debug!(moves = self.moves.len(), "reloaded move cache");
        Ok(self.moves.len())
    }

    /// The move with this id.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&Move> {
        self.moves.get(&id)
    }

    /// Display name for a move id, [`UNKNOWN_MOVE`] if absent.
    #[must_use]
    pub fn name_of(&self, id: RecordId) -> &str {
        self.get(id).map_or(UNKNOWN_MOVE, |m| m.name.as_str())
    }

    /// Display color for a move id.
    #[must_use]
    pub fn color_of(&self, id: RecordId) -> Option<&str> {
        self.get(id).and_then(|m| m.color.as_deref())
    }

    /// Active moves in id order.
    pub fn active(&self) -> impl Iterator<Item = &Move> {
        self.moves.values().filter(|m| m.is_active)
    }

    /// All moves in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.moves.values()
    }

    /// Number of cached moves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}
