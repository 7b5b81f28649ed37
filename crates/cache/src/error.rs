//! Cache Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Latitude/longitude outside the valid range, or not finite.
    #[display("invalid coordinate: ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    /// Reading or writing the cache file failed.
    #[display("cache file I/O error: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// Serialization/deserialization error.
    #[display("invalid cache data")]
    InvalidData,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

pub(crate) fn io_error(path: &std::path::Path) -> impl FnOnce() -> ErrorKind + '_ {
    move || ErrorKind::Io(path.to_path_buf())
}

