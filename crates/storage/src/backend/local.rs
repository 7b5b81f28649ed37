//! Local filesystem storage backend.
//!
//! Files live in a configured directory and are accessed via `tokio::fs`.

use crate::error::{ErrorKind, Result};
use crate::{StorageBackend, validate_name};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage backend.
///
/// # Examples
///
/// ```no_run
/// use renamr_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("photos", "/home/me/Pictures/2023")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LocalBackend {
    name: String,
    /// Directory containing the files being renamed
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend for an existing directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute or is not a directory.
    /// Unlike a library root, a rename directory is never created on demand.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let display = root.display().to_string();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidName(display));
        }
        match std::fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {},
            Ok(_) => exn::bail!(ErrorKind::BackendError(format!("not a directory: {display}"))),
            Err(e) => return Err(Self::map_io_error(e, &display).into()),
        }
        Ok(Self { name: name.into(), root })
    }

    /// The directory this backend operates on.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_name(name)?))
    }

    fn map_io_error(e: std::io::Error, name: &str) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(name.to_string()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(name.to_string()),
            std::io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists(name.to_string()),
            _ => ErrorKind::Io(e),
        }
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let abs_path = self.absolute_path(name)?;
        Ok(fs::try_exists(&abs_path).await.map_err(|e| Self::map_io_error(e, name))?)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from_path = self.absolute_path(from)?;
        let to_path = self.absolute_path(to)?;
        if !fs::try_exists(&from_path).await.map_err(|e| Self::map_io_error(e, from))? {
            exn::bail!(ErrorKind::NotFound(from.to_string()));
        }
        // `rename(2)` silently replaces the destination. The window between
        // this check and the rename is as small as the platform allows.
        if fs::try_exists(&to_path).await.map_err(|e| Self::map_io_error(e, to))? {
            exn::bail!(ErrorKind::AlreadyExists(to.to_string()));
        }
        tracing::trace!(backend = %self.name, from, to, "Renaming file");
        Ok(fs::rename(&from_path, &to_path).await.map_err(|e| Self::map_io_error(e, from))?)
    }
}
