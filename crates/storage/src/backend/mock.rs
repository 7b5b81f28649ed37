//! In-memory storage backend for testing.

use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::validate_name;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use tokio::sync::RwLock;

/// In-memory storage backend for testing.
///
/// File names are held in a set behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Names registered
/// with [`deny`](Self::deny) fail every operation with
/// [`PermissionDenied`](ErrorKind::PermissionDenied), which lets tests
/// exercise error propagation without touching real file permissions.
///
/// # Examples
///
/// ```
/// use renamr_storage::backend::{MockBackend, StorageBackend};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files(["IMG_0001.jpg"]);
/// assert!(backend.exists("IMG_0001.jpg").await?);
///
/// backend.rename("IMG_0001.jpg", "Prague.jpg").await?;
/// assert!(backend.exists("Prague.jpg").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MockBackend {
    files: RwLock<BTreeSet<String>>,
    denied: HashSet<String>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any name fails validation. If test setup is wrong, then the
    /// test should not pass.
    pub fn with_files(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut files = BTreeSet::new();
        for name in names {
            let name = name.into();
            if validate_name(&name).is_err() {
                // The panic here is DELIBERATE. MockBackend is only used in tests.
                panic!("MockBackend::with_files: invalid name {name:?}");
            }
            files.insert(name);
        }
        Self {
            files: RwLock::new(files),
            denied: HashSet::new(),
        }
    }

    /// Make every operation touching `name` fail with a permission error.
    pub fn deny(mut self, name: impl Into<String>) -> Self {
        self.denied.insert(name.into());
        self
    }

    /// Adds a file after construction, e.g. to simulate another process
    /// creating a file between planning and renaming.
    pub async fn insert(&self, name: impl Into<String>) {
        self.files.write().await.insert(name.into());
    }

    /// Sorted snapshot of all file names currently present.
    pub async fn names(&self) -> Vec<String> {
        self.files.read().await.iter().cloned().collect()
    }

    fn check<'a>(&self, name: &'a str) -> Result<&'a str> {
        let name = validate_name(name)?;
        if self.denied.contains(name) {
            exn::bail!(ErrorKind::PermissionDenied(name.to_string()));
        }
        Ok(name)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let name = self.check(name)?;
        Ok(self.files.read().await.contains(name))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from = self.check(from)?;
        let to = self.check(to)?;
        let mut guard = self.files.write().await;
        if guard.contains(to) {
            exn::bail!(ErrorKind::AlreadyExists(to.to_string()));
        }
        if !guard.remove(from) {
            exn::bail!(ErrorKind::NotFound(from.to_string()));
        }
        guard.insert(to.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_files() {
        let backend = MockBackend::with_files(["a.jpg", "b.jpg"]);
        assert!(backend.exists("a.jpg").await.unwrap());
        assert!(backend.exists("b.jpg").await.unwrap());
        assert!(!backend.exists("c.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_rename() {
        let backend = MockBackend::with_files(["old.jpg"]);
        backend.rename("old.jpg", "new.jpg").await.unwrap();
        assert_eq!(backend.names().await, vec!["new.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_rename_not_found() {
        let backend = MockBackend::default();
        let err = backend.rename("missing.jpg", "new.jpg").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rename_onto_existing() {
        let backend = MockBackend::with_files(["a.jpg", "b.jpg"]);
        let err = backend.rename("a.jpg", "b.jpg").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert_eq!(backend.names().await.len(), 2);
    }

    #[tokio::test]
    async fn test_denied() {
        let backend = MockBackend::with_files(["a.jpg"]).deny("locked.jpg");
        let err = backend.exists("locked.jpg").await.unwrap_err();
        assert!(err.is_permission());
        let err = backend.rename("a.jpg", "locked.jpg").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::PermissionDenied(_)));
        assert!(backend.exists("a.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_insert() {
        let backend = MockBackend::default();
        backend.insert("late.jpg").await;
        assert!(backend.exists("late.jpg").await.unwrap());
    }

    #[test]
    #[should_panic(expected = "invalid name")]
    fn test_with_files_panics_on_bad_name() {
        MockBackend::with_files(["../escape.jpg"]);
    }
}
