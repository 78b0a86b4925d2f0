//! liftlog storage core
//!
//! Persistent storage for a personal exercise tracker: a catalog of moves
//! with unique display colors, recorded sets, and labels.
//!
//! # Features
//!
//! - Two interchangeable backends behind one [`traits::StorageTrait`]
//! - Versioned schema upgrades with a resumable color back-fill
//! - `SQLite` image export and validated import on the relational backend
//! - Backend preference with automatic fallback to the embedded store
//!
//! # Quick Start
//!
//! ```bash
//! LIFTLOG_DATA_DIR=./data ./liftlog summary
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   StorageTrait   ┌──────────────────┐
//! │ presentation │─────────────────▶│     Storage      │
//! │  MoveCache   │◀─────────────────│ (chosen once by  │
//! │ VolumeSeries │                  │    selector)     │
//! └──────────────┘                  └───┬──────────┬───┘
//!                                       │          │
//!                                       ▼          ▼
//!                                     redb      SQLite
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod color;
pub mod config;
pub mod error;
pub mod selector;
pub mod series;
pub mod storage;
pub mod traits;
pub mod validation;

#[cfg(test)]
mod test_utils;
