//! Relational backend over a private `SQLite` database.
//!
//! The implementation is split across submodules:
//! - `core`: scratch database lifecycle, session mirroring, error mapping
//! - `migrations`: DDL and the color back-fill
//! - `image`: export, import and schema validation of database images
//! - `moves`, `history`, `labels`: entity operations
//! - `trait_impl`: `StorageTrait` implementation

mod core;
mod history;
mod image;
mod labels;
mod migrations;
mod moves;
mod trait_impl;

pub use self::core::RelationalStore;
