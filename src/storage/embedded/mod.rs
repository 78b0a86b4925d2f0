//! Embedded object-store backend over `redb`.
//!
//! The implementation is split across submodules:
//! - `tables`: table definitions and record encoding
//! - `migrations`: schema versioning and the color back-fill
//! - `core`: opening and initialization
//! - `moves`, `history`, `labels`: entity operations
//! - `trait_impl`: `StorageTrait` implementation

mod core;
mod history;
mod labels;
mod migrations;
mod moves;
mod tables;
mod trait_impl;

pub use self::core::EmbeddedStore;
pub use migrations::SCHEMA_VERSION;
