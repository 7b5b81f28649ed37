//! Recovery Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A recovery error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for recovery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors recorded on failed [`Recovery`](crate::Recovery) values produced
/// by the fallbacks themselves.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The operating system refused access; the file should be skipped.
    #[display("permission denied during {operation}: {}", path.display())]
    PermissionDenied { path: PathBuf, operation: String },
    /// A file could not be read as the expected format.
    #[display("corrupted file: {}", _0.display())]
    CorruptedFile(#[error(not(source))] PathBuf),
    /// An optional external tool is not installed or not runnable.
    #[display("tool unavailable: {_0}")]
    ToolUnavailable(#[error(not(source))] String),
    /// A failure logged and passed over by the caller.
    #[display("{_0}")]
    Logged(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
