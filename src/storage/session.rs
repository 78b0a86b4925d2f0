//! Session-scoped database image.
//!
//! The relational backend mirrors its full database into a [`SessionImage`]
//! after every mutating operation. The slot lives as long as the process, so
//! a store reopened with the same slot picks up where the previous instance
//! left off, while a process restart starts empty.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared in-process slot holding the latest serialized database.
///
/// Cloning yields another handle to the same slot.
#[derive(Debug, Clone, Default)]
pub struct SessionImage {
    slot: Arc<Mutex<Option<Vec<u8>>>>,
}

impl SessionImage {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Option<Vec<u8>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the stored image, if any.
    #[must_use]
    pub fn load(&self) -> Option<Vec<u8>> {
        self.guard().clone()
    }

    /// Replace the stored image.
    pub fn store(&self, image: Vec<u8>) {
        *self.guard() = Some(image);
    }

    /// Forget the stored image.
    pub fn clear(&self) {
        *self.guard() = None;
    }

    /// Whether an image is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_slot() {
        let session = SessionImage::new();
        let other = session.clone();
        assert!(other.is_empty());

        session.store(vec![1, 2, 3]);
        assert_eq!(other.load(), Some(vec![1, 2, 3]));

        other.clear();
        assert!(session.is_empty());
        assert_eq!(session.load(), None);
    }
}
