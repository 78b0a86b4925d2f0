//! Storage backends.
//!
//! This module provides the two interchangeable implementations of
//! [`StorageTrait`](crate::traits::StorageTrait):
//! - [`EmbeddedStore`]: a versioned key-indexed store on `redb`
//! - [`RelationalStore`]: a private `SQLite` database driven through `sqlx`,
//!   mirrored into a [`SessionImage`] after every write
//!
//! # Architecture
//!
//! Both backends run each logical write inside one transaction, allocate
//! move colors through the shared [`ColorAllocator`], and validate every
//! value before it is persisted.
//!
//! The implementation is split across submodules:
//! - `embedded`: the object-store backend and its schema upgrades
//! - `relational`: the relational backend, its DDL migrations and the
//!   image import and export
//! - `session`: the session-scoped image slot
//!
//! # Example
//!
//! ```ignore
//! use liftlog::storage::{BackendContext, EmbeddedStore};
//!
//! let store = EmbeddedStore::open_in_memory(BackendContext::default()).await?;
//! let squat = store.add_move("Squat").await?;
//! ```

mod embedded;
mod relational;
mod session;

use std::fmt;
use std::sync::Arc;

use crate::color::ColorAllocator;
use crate::traits::{RealTimeProvider, TimeProvider};

pub use embedded::{EmbeddedStore, SCHEMA_VERSION};
pub use relational::RelationalStore;
pub use session::SessionImage;

/// Collaborators shared by both backends.
#[derive(Clone)]
pub struct BackendContext {
    /// Allocates unique move colors.
    pub allocator: ColorAllocator,
    /// Stamps new history entries.
    pub clock: Arc<dyn TimeProvider>,
}

impl BackendContext {
    /// Create a context from an allocator and a clock.
    #[must_use]
    pub fn new(allocator: ColorAllocator, clock: Arc<dyn TimeProvider>) -> Self {
        Self { allocator, clock }
    }
}

impl Default for BackendContext {
    fn default() -> Self {
        Self::new(ColorAllocator::default(), Arc::new(RealTimeProvider))
    }
}

impl fmt::Debug for BackendContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendContext")
            .field("allocator", &self.allocator)
            .finish_non_exhaustive()
    }
}
