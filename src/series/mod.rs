//! Training volume series.
//!
//! Groups recorded sets by move into time series of `kg × reps`, one series
//! per move that has history. Each series carries the move's display color
//! so every chart line matches the move elsewhere in the app.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::MoveCache;
use crate::error::StorageError;
use crate::traits::{HistoryEntry, RecordId, StorageTrait};

/// One set's contribution to a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumePoint {
    /// When the set was recorded, in epoch milliseconds.
    pub created: i64,
    /// `kg × reps` of the set.
    pub volume: f64,
}

/// All sets of one move, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeSeries {
    /// The move.
    pub move_id: RecordId,
    /// The move's current name.
    pub move_name: String,
    /// The move's display color, if it has one.
    pub color: Option<String>,
    /// Points in recording order.
    pub points: Vec<VolumePoint>,
}

impl VolumeSeries {
    /// Sum of all point volumes.
    #[must_use]
    pub fn total_volume(&self) -> f64 {
        self.points.iter().map(|p| p.volume).sum()
    }

    /// Largest single-set volume.
    #[must_use]
    pub fn best_volume(&self) -> Option<f64> {
        self.points.iter().map(|p| p.volume).reduce(f64::max)
    }
}

/// Build one series per move from `history`, ordered by move name.
///
/// Colors come from `moves`; a move missing from the cache keeps the name
/// carried by its history entries and gets no color.
#[must_use]
pub fn build_series(history: &[HistoryEntry], moves: &MoveCache) -> Vec<VolumeSeries> {
    let mut by_move: BTreeMap<RecordId, VolumeSeries> = BTreeMap::new();
    let mut ordered: Vec<&HistoryEntry> = history.iter().collect();
    ordered.sort_by_key(|h| (h.created, h.id));

    for entry in ordered {
        by_move
            .entry(entry.move_id)
            .or_insert_with(|| VolumeSeries {
                move_id: entry.move_id,
                move_name: moves
                    .get(entry.move_id)
                    .map_or_else(|| entry.move_name.clone(), |m| m.name.clone()),
                color: moves.color_of(entry.move_id).map(str::to_string),
                points: Vec::new(),
            })
            .points
            .push(VolumePoint {
                created: entry.created,
                volume: entry.volume(),
            });
    }

    let mut series: Vec<_> = by_move.into_values().collect();
    series.sort_by(|a, b| a.move_name.cmp(&b.move_name).then(a.move_id.cmp(&b.move_id)));
    series
}

/// Length of the longest series; the chart's x axis spans this many sets.
#[must_use]
pub fn longest_series(series: &[VolumeSeries]) -> usize {
    series.iter().map(|s| s.points.len()).max().unwrap_or(0)
}

/// Read history and the catalog from `storage` and build the series.
///
/// # Errors
///
/// Returns the storage error if either read fails.
pub async fn load_series(storage: &dyn StorageTrait) -> Result<Vec<VolumeSeries>, StorageError> {
    let moves = MoveCache::load(storage).await?;
    let history = storage.get_all_history().await?;
    Ok(build_series(&history, &moves))
}
