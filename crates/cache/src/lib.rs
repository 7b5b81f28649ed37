//! Coordinate proximity cache for place labels.
//!
//! Reverse geocoding is slow and rate limited, and photos taken on the same
//! walk share nearly identical coordinates. This crate remembers the label
//! resolved for each coordinate and answers lookups for any later coordinate
//! that falls within a small tolerance of one already seen.
//!
//! The cache is an explicit value: callers own a [`ProximityCache`], decide
//! when it's loaded and saved, and serialize mutations themselves if they
//! share it between tasks. It is persisted as a single JSON document, written
//! atomically (temporary file plus rename).

mod coordinate;
mod entry;
pub mod error;
mod persist;
mod proximity;

pub use crate::coordinate::{Coordinate, TOLERANCE_EPSILON};
pub use crate::entry::CacheEntry;
pub use crate::persist::LoadOutcome;
pub use crate::proximity::{CacheOptions, CacheStats, ProximityCache};

/// Default maximum number of entries kept.
pub const DEFAULT_MAX_ENTRIES: usize = 1000;
/// Default matching tolerance, in degrees per axis (roughly 100m of latitude).
pub const DEFAULT_TOLERANCE: f64 = 0.001;
