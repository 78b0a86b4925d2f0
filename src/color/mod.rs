//! Unique display colors for moves.
//!
//! Colors are HSL strings at fixed saturation and lightness with a random
//! hue. The allocator draws candidates from a [`HueSource`] and asks the
//! calling backend whether each one is already taken, giving up after a
//! fixed number of attempts.
//!
//! # Example
//!
//! ```
//! use std::collections::HashSet;
//! use std::sync::Arc;
//! use liftlog::color::{ColorAllocator, CycleHueSource};
//!
//! let allocator = ColorAllocator::new(Arc::new(CycleHueSource::new(vec![210, 30])));
//! let taken: HashSet<String> = ["hsl(210, 70%, 50%)".to_string()].into();
//!
//! let color = allocator.allocate(|c| Ok(taken.contains(c))).unwrap();
//! assert_eq!(color, "hsl(30, 70%, 50%)");
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::Rng;

use crate::error::StorageError;

/// Default bound on candidate draws before giving up.
pub const MAX_COLOR_ATTEMPTS: u32 = 50;

/// Number of distinct hues.
pub const HUE_RANGE: u16 = 360;

/// Format a hue as the stored color string.
#[must_use]
pub fn format_color(hue: u16) -> String {
    format!("hsl({}, 70%, 50%)", hue % HUE_RANGE)
}

/// Source of candidate hues.
///
/// Production code uses [`RandomHueSource`]; tests inject a deterministic
/// source to reproduce collisions and exhaustion.
#[cfg_attr(test, mockall::automock)]
pub trait HueSource: Send + Sync {
    /// Draw the next hue. Values are reduced modulo 360.
    fn next_hue(&self) -> u16;
}

/// Uniformly random hues from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomHueSource;

impl HueSource for RandomHueSource {
    fn next_hue(&self) -> u16 {
        rand::thread_rng().gen_range(0..HUE_RANGE)
    }
}

/// Deterministic source that cycles through a fixed list of hues.
#[derive(Debug)]
pub struct CycleHueSource {
    hues: Vec<u16>,
    position: AtomicUsize,
}

impl CycleHueSource {
    /// Create a source cycling through `hues`. An empty list yields hue 0.
    #[must_use]
    pub fn new(hues: Vec<u16>) -> Self {
        Self {
            hues,
            position: AtomicUsize::new(0),
        }
    }
}

impl HueSource for CycleHueSource {
    fn next_hue(&self) -> u16 {
        if self.hues.is_empty() {
            return 0;
        }
        let index = self.position.fetch_add(1, Ordering::Relaxed) % self.hues.len();
        self.hues[index]
    }
}

/// Bounded-retry allocator of unique colors.
#[derive(Clone)]
pub struct ColorAllocator {
    source: Arc<dyn HueSource>,
    max_attempts: u32,
}

impl fmt::Debug for ColorAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColorAllocator")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl Default for ColorAllocator {
    fn default() -> Self {
        Self::new(Arc::new(RandomHueSource))
    }
}

impl ColorAllocator {
    /// Create an allocator over `source` with the default attempt bound.
    #[must_use]
    pub fn new(source: Arc<dyn HueSource>) -> Self {
        Self {
            source,
            max_attempts: MAX_COLOR_ATTEMPTS,
        }
    }

    /// Override the attempt bound. Zero is treated as one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// The configured attempt bound.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Draw candidates until `is_taken` reports a free one.
    ///
    /// `is_taken` is the backend's own uniqueness lookup and runs inside
    /// whatever transaction the backend holds.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ColorExhausted`] when every attempt collided,
    /// or the first error raised by `is_taken`.
    pub fn allocate<F>(&self, mut is_taken: F) -> Result<String, StorageError>
    where
        F: FnMut(&str) -> Result<bool, StorageError>,
    {
        for _ in 0..self.max_attempts {
            let candidate = format_color(self.source.next_hue());
            if !is_taken(&candidate)? {
                return Ok(candidate);
            }
        }
        tracing::warn!(
            attempts = self.max_attempts,
            "color allocation exhausted its attempts"
        );
        Err(StorageError::ColorExhausted {
            attempts: self.max_attempts,
        })
    }
}
