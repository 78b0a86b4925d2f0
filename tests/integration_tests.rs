//! Integration tests for the liftlog storage core.
//!
//! Every scenario runs against both backends through the selector:
//! - Move lifecycle and color uniqueness
//! - History and label workflows
//! - Delete guards and cascades
//! - Re-initialization

use liftlog::error::{StorageError, ValidationError};
use liftlog::selector::{open_storage, BackendKind, OpenOptions, Storage};
use liftlog::traits::{MoveUpdate, StorageTrait};
use liftlog::validation::{validate_reps, validate_weight};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use test_case::test_case;

// ============================================================================
// Test Utilities
// ============================================================================

async fn open(kind: BackendKind) -> Storage {
    open_storage(kind, OpenOptions::in_memory())
        .await
        .expect("Failed to open storage")
}

// ============================================================================
// Move Workflow Tests
// ============================================================================

#[test_case(BackendKind::EmbeddedStore ; "embedded")]
#[test_case(BackendKind::Relational ; "relational")]
#[tokio::test]
async fn test_every_move_gets_a_distinct_color(kind: BackendKind) {
    let storage = open(kind).await;
    for name in ["Squat", "Bench", "Deadlift", "Row", "Press", "Curl"] {
        storage.add_move(name).await.unwrap();
    }

    let moves = storage.get_all_moves(false).await.unwrap();
    let colors: HashSet<_> = moves
        .iter()
        .map(|m| m.color.clone().expect("color assigned"))
        .collect();
    assert_eq!(colors.len(), moves.len());
    assert!(colors.iter().all(|c| c.starts_with("hsl(")));
}

#[test_case(BackendKind::EmbeddedStore ; "embedded")]
#[test_case(BackendKind::Relational ; "relational")]
#[tokio::test]
async fn test_first_move_first_set(kind: BackendKind) {
    let storage = open(kind).await;

    assert_eq!(storage.add_move("Squat").await.unwrap(), 1);
    let squat = storage.get_move_by_id(1).await.unwrap().unwrap();
    assert!(squat.color.unwrap().starts_with("hsl("));

    assert_eq!(storage.add_history(5, 100.0, 1).await.unwrap(), 1);
    let history = storage.get_all_history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].move_name, "Squat");
    assert_eq!((history[0].reps, history[0].kg), (5, 100.0));
}

#[test_case(BackendKind::EmbeddedStore ; "embedded")]
#[test_case(BackendKind::Relational ; "relational")]
#[tokio::test]
async fn test_moves_listed_by_name_with_active_filter(kind: BackendKind) {
    let storage = open(kind).await;
    let squat = storage.add_move("Squat").await.unwrap();
    storage.add_move("Bench").await.unwrap();
    storage.add_move("Deadlift").await.unwrap();

    let mut update = MoveUpdate::from_move(&storage.get_move_by_id(squat).await.unwrap().unwrap());
    update.is_active = false;
    update.description = "High bar".into();
    storage.update_move(squat, &update).await.unwrap();

    let all: Vec<_> = storage
        .get_all_moves(false)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(all, vec!["Bench", "Deadlift", "Squat"]);

    let active: Vec<_> = storage
        .get_all_moves(true)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(active, vec!["Bench", "Deadlift"]);

    let stored = storage.get_move_by_id(squat).await.unwrap().unwrap();
    assert_eq!(stored.description, "High bar");
    assert!(!stored.is_active);
}

#[test_case(BackendKind::EmbeddedStore ; "embedded")]
#[test_case(BackendKind::Relational ; "relational")]
#[tokio::test]
async fn test_taken_color_is_rejected(kind: BackendKind) {
    let storage = open(kind).await;
    let squat = storage.add_move("Squat").await.unwrap();
    let bench = storage.add_move("Bench").await.unwrap();
    let squat_color = storage.get_move_by_id(squat).await.unwrap().unwrap().color;
    let bench_color = storage.get_move_by_id(bench).await.unwrap().unwrap().color;

    let update = MoveUpdate::new("Bench").with_color(squat_color.clone().unwrap());
    let err = storage.update_move(bench, &update).await.unwrap_err();
    assert!(matches!(err, StorageError::Constraint { .. }));
    assert_eq!(
        storage.get_move_by_id(bench).await.unwrap().unwrap().color,
        bench_color
    );

    // A fresh color from the generator is free to use.
    let fresh = storage.generate_unique_color().await.unwrap();
    let update = MoveUpdate::new("Bench").with_color(fresh.clone());
    storage.update_move(bench, &update).await.unwrap();
    assert_eq!(
        storage.get_move_by_id(bench).await.unwrap().unwrap().color,
        Some(fresh)
    );
}

#[test_case(BackendKind::EmbeddedStore ; "embedded")]
#[test_case(BackendKind::Relational ; "relational")]
#[tokio::test]
async fn test_duplicate_and_invalid_names(kind: BackendKind) {
    let storage = open(kind).await;
    storage.add_move("Squat").await.unwrap();

    assert!(matches!(
        storage.add_move("  Squat ").await.unwrap_err(),
        StorageError::Constraint { .. }
    ));
    assert!(matches!(
        storage.add_move("Squat;DROP").await.unwrap_err(),
        StorageError::Validation(ValidationError::InvalidCharacters { .. })
    ));
    assert_eq!(storage.get_all_moves(false).await.unwrap().len(), 1);
}

#[test_case(BackendKind::EmbeddedStore ; "embedded")]
#[test_case(BackendKind::Relational ; "relational")]
#[tokio::test]
async fn test_inactive_move_still_holds_its_name(kind: BackendKind) {
    let storage = open(kind).await;
    let squat = storage.add_move("Squat").await.unwrap();
    let bench = storage.add_move("Bench").await.unwrap();

    let mut update = MoveUpdate::from_move(&storage.get_move_by_id(squat).await.unwrap().unwrap());
    update.is_active = false;
    storage.update_move(squat, &update).await.unwrap();

    assert!(matches!(
        storage.add_move("Squat").await.unwrap_err(),
        StorageError::Constraint { .. }
    ));
    let rename = MoveUpdate::from_move(&storage.get_move_by_id(bench).await.unwrap().unwrap());
    let rename = MoveUpdate {
        name: "Squat".into(),
        ..rename
    };
    assert!(matches!(
        storage.update_move(bench, &rename).await.unwrap_err(),
        StorageError::Constraint { .. }
    ));

    assert_eq!(
        storage.get_move_by_id(bench).await.unwrap().unwrap().name,
        "Bench"
    );
    assert_eq!(storage.get_all_moves(false).await.unwrap().len(), 2);
    assert_eq!(storage.get_all_moves(true).await.unwrap().len(), 1);
}

// ============================================================================
// Delete Guards
// ============================================================================

#[test_case(BackendKind::EmbeddedStore ; "embedded")]
#[test_case(BackendKind::Relational ; "relational")]
#[tokio::test]
async fn test_delete_move_without_history_cascades_labels(kind: BackendKind) {
    let storage = open(kind).await;
    let squat = storage.add_move("Squat").await.unwrap();
    let legs = storage.add_label("Legs").await.unwrap();
    storage.add_label_to_move(squat, legs).await.unwrap();

    storage.delete_move(squat).await.unwrap();

    assert!(storage.get_move_by_id(squat).await.unwrap().is_none());
    assert!(storage.get_labels_for_move(squat).await.unwrap().is_empty());
    assert_eq!(storage.get_all_labels().await.unwrap().len(), 1);
    assert!(matches!(
        storage.delete_move(squat).await.unwrap_err(),
        StorageError::NotFound { .. }
    ));
}

#[test_case(BackendKind::EmbeddedStore ; "embedded")]
#[test_case(BackendKind::Relational ; "relational")]
#[tokio::test]
async fn test_delete_move_with_history_is_refused(kind: BackendKind) {
    let storage = open(kind).await;
    let squat = storage.add_move("Squat").await.unwrap();
    let legs = storage.add_label("Legs").await.unwrap();
    storage.add_label_to_move(squat, legs).await.unwrap();
    storage.add_history(5, 100.0, squat).await.unwrap();
    storage.add_history(3, 110.0, squat).await.unwrap();

    let before = (
        storage.get_move_by_id(squat).await.unwrap(),
        storage.get_all_history().await.unwrap(),
        storage.get_labels_for_move(squat).await.unwrap(),
    );

    let err = storage.delete_move(squat).await.unwrap_err();
    assert_eq!(
        err,
        StorageError::constraint("Cannot delete a move with history (2 sets recorded)")
    );

    let after = (
        storage.get_move_by_id(squat).await.unwrap(),
        storage.get_all_history().await.unwrap(),
        storage.get_labels_for_move(squat).await.unwrap(),
    );
    assert_eq!(before, after);
}

// ============================================================================
// Labels
// ============================================================================

#[test_case(BackendKind::EmbeddedStore ; "embedded")]
#[test_case(BackendKind::Relational ; "relational")]
#[tokio::test]
async fn test_label_attached_once(kind: BackendKind) {
    let storage = open(kind).await;
    storage.add_move("Squat").await.unwrap();

    assert_eq!(storage.add_label("Legs").await.unwrap(), 1);
    storage.add_label_to_move(1, 1).await.unwrap();
    assert!(matches!(
        storage.add_label_to_move(1, 1).await.unwrap_err(),
        StorageError::Constraint { .. }
    ));

    let labels = storage.get_labels_for_move(1).await.unwrap();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].name, "Legs");
}

// ============================================================================
// History
// ============================================================================

#[test_case(BackendKind::EmbeddedStore ; "embedded")]
#[test_case(BackendKind::Relational ; "relational")]
#[tokio::test]
async fn test_history_edit_cycle(kind: BackendKind) {
    let storage = open(kind).await;
    let squat = storage.add_move("Squat").await.unwrap();
    let bench = storage.add_move("Bench").await.unwrap();
    let first = storage.add_history(5, 100.0, squat).await.unwrap();
    storage.add_history(8, 60.0, bench).await.unwrap();

    storage.update_history(first, 105.0, 4).await.unwrap();
    let squat_sets = storage.get_history_by_move(squat).await.unwrap();
    assert_eq!(squat_sets.len(), 1);
    assert_eq!((squat_sets[0].kg, squat_sets[0].reps), (105.0, 4));

    storage.delete_history(first).await.unwrap();
    assert!(storage.get_history_by_move(squat).await.unwrap().is_empty());
    assert_eq!(storage.get_all_history().await.unwrap().len(), 1);

    assert!(matches!(
        storage.add_history(10_000, 1.0, bench).await.unwrap_err(),
        StorageError::Validation(_)
    ));
    assert!(matches!(
        storage.add_history(1, 1.0, 99).await.unwrap_err(),
        StorageError::NotFound { .. }
    ));
}

// ============================================================================
// Initialization
// ============================================================================

#[test_case(BackendKind::EmbeddedStore ; "embedded")]
#[test_case(BackendKind::Relational ; "relational")]
#[tokio::test]
async fn test_init_twice_is_harmless(kind: BackendKind) {
    let storage = open(kind).await;
    let squat = storage.add_move("Squat").await.unwrap();
    storage.add_history(5, 100.0, squat).await.unwrap();
    let label = storage.add_label("Legs").await.unwrap();
    storage.add_label_to_move(squat, label).await.unwrap();

    let before = (
        storage.get_all_moves(false).await.unwrap(),
        storage.get_all_history().await.unwrap(),
        storage.get_all_labels().await.unwrap(),
    );
    storage.init().await.unwrap();
    storage.init().await.unwrap();
    let after = (
        storage.get_all_moves(false).await.unwrap(),
        storage.get_all_history().await.unwrap(),
        storage.get_all_labels().await.unwrap(),
    );
    assert_eq!(before, after);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_validation_boundaries() {
    assert!(validate_reps("10000").is_err());
    assert!(validate_weight("-1").is_err());
    assert_eq!(validate_reps("0").unwrap(), 0);
    assert_eq!(validate_weight("9999").unwrap(), 9999.0);
}
