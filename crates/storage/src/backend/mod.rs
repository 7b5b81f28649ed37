//! Storage backend trait and implementations.
//!
//! This module defines the [`StorageBackend`] trait: the narrow set of
//! filesystem capabilities that name resolution and rename execution need.

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod ro;

pub use self::local::LocalBackend;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockBackend;
pub use self::ro::ReadOnlyBackend;
use crate::error::Result;
use async_trait::async_trait;

/// Unified interface over a directory of files.
///
/// All operations are asynchronous so that slow or remote filesystems don't
/// block the runtime. Names are single file names relative to the backend's
/// directory and must pass [`validate_name`](crate::validate_name);
/// implementations enforce this.
///
/// # Examples
///
/// ```
/// use renamr_storage::{StorageBackend, error::Result};
///
/// async fn rename_if_free(backend: &dyn StorageBackend, from: &str, to: &str) -> Result<bool> {
///     if backend.exists(to).await? {
///         return Ok(false);
///     }
///     backend.rename(from, to).await?;
///     Ok(true)
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Human-readable identifier, used in log output.
    fn name(&self) -> &str;

    /// Whether a file called `name` currently exists in the directory.
    ///
    /// A missing file is `Ok(false)`; any other failure to determine
    /// existence (permissions, I/O) is an error.
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Renames `from` to `to` within the directory.
    ///
    /// Fails with [`NotFound`](crate::error::ErrorKind::NotFound) when `from`
    /// is missing and [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists)
    /// when `to` is taken. Existing files are never overwritten.
    async fn rename(&self, from: &str, to: &str) -> Result<()>;
}
