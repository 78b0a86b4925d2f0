//! Record types exchanged across the storage boundary.
//!
//! This module defines the plain records both backends return:
//! - [`Move`]: An exercise definition
//! - [`HistoryEntry`]: One recorded set, joined with its move's name
//! - [`Label`]: A free-form tag
//! - [`MoveLabel`]: A label attached to a move, with the association id
//! - [`MoveUpdate`]: The editable fields of a move

use serde::{Deserialize, Serialize};

/// Identifier assigned by a backend. Positive and immutable.
pub type RecordId = i64;

/// An exercise definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// Backend-assigned identifier.
    pub id: RecordId,
    /// Unique display name.
    pub name: String,
    /// Free-form description; empty when unset.
    #[serde(default)]
    pub description: String,
    /// Link to a demonstration video; empty when unset.
    #[serde(default)]
    pub youtube_link: String,
    /// Inactive moves are hidden from the set entry form.
    pub is_active: bool,
    /// Unique display color. Always present once the store is initialized;
    /// only records written before color support lack one.
    #[serde(default)]
    pub color: Option<String>,
}

impl Move {
    /// Create an active move with empty metadata and no color.
    #[must_use]
    pub fn new(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            youtube_link: String::new(),
            is_active: true,
            color: None,
        }
    }

    /// Set the color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// One recorded set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Backend-assigned identifier.
    pub id: RecordId,
    /// The move this set belongs to.
    pub move_id: RecordId,
    /// Repetitions, 0 to 9999.
    pub reps: u32,
    /// Weight in kilograms, 0 to 9999.
    pub kg: f64,
    /// Creation time in milliseconds since the Unix epoch.
    pub created: i64,
    /// Current name of the owning move. Derived, not stored.
    #[serde(rename = "moveName")]
    pub move_name: String,
}

impl HistoryEntry {
    /// Training volume of this set (`kg × reps`).
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.kg * f64::from(self.reps)
    }
}

/// A free-form tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Backend-assigned identifier.
    pub id: RecordId,
    /// Unique label name.
    pub name: String,
}

impl Label {
    /// Create a label record.
    #[must_use]
    pub fn new(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A label as attached to a particular move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLabel {
    /// The label's identifier.
    pub id: RecordId,
    /// The label's name.
    pub name: String,
    /// Identifier of the association row; pass it to
    /// `remove_label_from_move`.
    pub move_label_id: RecordId,
}

/// New values for the editable fields of a move.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoveUpdate {
    /// New name; validated like a new move's name.
    pub name: String,
    /// New description.
    pub description: String,
    /// New video link.
    pub youtube_link: String,
    /// New active flag.
    pub is_active: bool,
    /// New color, or `None` to keep the current one.
    pub color: Option<String>,
}

impl MoveUpdate {
    /// Start an update that renames the move and keeps it active.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_active: true,
            ..Self::default()
        }
    }

    /// Prefill an update from the move's current values.
    #[must_use]
    pub fn from_move(current: &Move) -> Self {
        Self {
            name: current.name.clone(),
            description: current.description.clone(),
            youtube_link: current.youtube_link.clone(),
            is_active: current.is_active,
            color: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the video link.
    #[must_use]
    pub fn with_youtube_link(mut self, link: impl Into<String>) -> Self {
        self.youtube_link = link.into();
        self
    }

    /// Set the active flag.
    #[must_use]
    pub const fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Request a color change.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}
