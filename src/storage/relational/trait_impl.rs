//! `StorageTrait` implementation for `RelationalStore`.

#![allow(clippy::missing_errors_doc)]

use async_trait::async_trait;

use super::core::RelationalStore;
use crate::error::StorageError;
use crate::traits::{HistoryEntry, Label, Move, MoveLabel, MoveUpdate, RecordId, StorageTrait};

#[async_trait]
impl StorageTrait for RelationalStore {
    async fn init(&self) -> Result<(), StorageError> {
        Self::init(self).await
    }

    async fn add_history(
        &self,
        reps: i64,
        kg: f64,
        move_id: RecordId,
    ) -> Result<RecordId, StorageError> {
        Self::add_history(self, reps, kg, move_id).await
    }

    async fn get_all_history(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        Self::get_all_history(self).await
    }

    async fn update_history(&self, id: RecordId, kg: f64, reps: i64) -> Result<(), StorageError> {
        Self::update_history(self, id, kg, reps).await
    }

    async fn delete_history(&self, id: RecordId) -> Result<(), StorageError> {
        Self::delete_history(self, id).await
    }

    async fn get_history_by_move(
        &self,
        move_id: RecordId,
    ) -> Result<Vec<HistoryEntry>, StorageError> {
        Self::get_history_by_move(self, move_id).await
    }

    async fn add_move(&self, name: &str) -> Result<RecordId, StorageError> {
        Self::add_move(self, name).await
    }

    async fn get_move_by_id(&self, id: RecordId) -> Result<Option<Move>, StorageError> {
        Self::get_move_by_id(self, id).await
    }

    async fn get_all_moves(&self, active_only: bool) -> Result<Vec<Move>, StorageError> {
        Self::get_all_moves(self, active_only).await
    }

    async fn update_move(&self, id: RecordId, update: &MoveUpdate) -> Result<(), StorageError> {
        Self::update_move(self, id, update).await
    }

    async fn delete_move(&self, id: RecordId) -> Result<(), StorageError> {
        Self::delete_move(self, id).await
    }

    async fn add_label(&self, name: &str) -> Result<RecordId, StorageError> {
        Self::add_label(self, name).await
    }

    async fn get_all_labels(&self) -> Result<Vec<Label>, StorageError> {
        Self::get_all_labels(self).await
    }

    async fn add_label_to_move(
        &self,
        move_id: RecordId,
        label_id: RecordId,
    ) -> Result<RecordId, StorageError> {
        Self::add_label_to_move(self, move_id, label_id).await
    }

    async fn get_labels_for_move(
        &self,
        move_id: RecordId,
    ) -> Result<Vec<MoveLabel>, StorageError> {
        Self::get_labels_for_move(self, move_id).await
    }

    async fn remove_label_from_move(&self, move_label_id: RecordId) -> Result<(), StorageError> {
        Self::remove_label_from_move(self, move_label_id).await
    }

    async fn generate_unique_color(&self) -> Result<String, StorageError> {
        Self::generate_unique_color(self).await
    }
}
