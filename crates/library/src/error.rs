//! Library Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Batch-level operations never return these directly:
//! a failure is attached to the record it belongs to (see
//! [`Planned::Failed`](crate::Planned::Failed) and
//! [`Action::Failed`](crate::rename::Action::Failed)).

use derive_more::{Display, Error};
use renamr_storage::error::{Error as StorageError, ErrorKind as StorageErrorKind};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a planning or rename failure.
///
/// ### Operational Errors
/// - [`ErrorKind::Conflict`]
/// - [`ErrorKind::Collision`]
/// - [`ErrorKind::SourceMissing`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Storage`]
/// - [`ErrorKind::PermissionDenied`]
/// - [`ErrorKind::Cache`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A storage backend operation (existence check, rename) failed.
    #[display("storage operation failed")]
    Storage,
    /// The operating system refused access to a file.
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// Every conflict suffix up to the search limit is taken.
    #[display("no available name for {_0}")]
    Conflict(#[error(not(source))] String),
    /// The target appeared between conflict resolution and the rename.
    #[display("target file already exists after conflict resolution: {_0}")]
    Collision(#[error(not(source))] String),
    /// The file to rename is no longer there.
    #[display("source file not found: {_0}")]
    SourceMissing(#[error(not(source))] String),
    /// Reading or writing the label cache file failed.
    #[display("label cache could not be persisted")]
    Cache,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Late collisions are deliberately excluded: they are reported for the
    /// one record, never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage | Self::Cache)
    }
}

/// Re-raises a storage error under the library kind that tells the caller
/// what to do about it.
#[track_caller]
pub(crate) fn from_storage(error: StorageError) -> Error {
    let kind = match &*error {
        StorageErrorKind::AlreadyExists(name) => ErrorKind::Collision(name.clone()),
        StorageErrorKind::NotFound(name) => ErrorKind::SourceMissing(name.clone()),
        StorageErrorKind::PermissionDenied(name) => ErrorKind::PermissionDenied(name.clone()),
        kind if kind.is_permission() => ErrorKind::PermissionDenied(kind.to_string()),
        _ => ErrorKind::Storage,
    };
    error.raise(kind)
}
