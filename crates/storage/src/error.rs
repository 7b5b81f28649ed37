//! Storage Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File does not exist
    #[display("file not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Access denied by the operating system
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// Rename target is already taken
    #[display("file already exists: {_0}")]
    AlreadyExists(#[error(not(source))] String),
    /// Name is empty, contains a separator, or would leave the directory
    #[display("invalid file name: {_0:?}")]
    InvalidName(#[error(not(source))] String),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Backend-specific error
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::BackendError(_))
    }

    /// Returns `true` for errors caused by filesystem permissions.
    pub fn is_permission(&self) -> bool {
        match self {
            Self::PermissionDenied(_) => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }
}
