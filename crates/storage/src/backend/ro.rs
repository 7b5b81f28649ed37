//! Read-only storage backend.
//!
//! Wraps another backend and drops renames while still reporting success.
//! Used for dry runs: everything up to the rename itself executes for real.

use async_trait::async_trait;

use crate::{BackendHandle, StorageBackend, error::Result, validate_name};

/// Read-only storage backend.
///
/// Existence checks are forwarded; renames are validated, logged as an
/// [`info event`](tracing::Event) and skipped.
#[derive(Clone)]
pub struct ReadOnlyBackend {
    inner: BackendHandle,
}
impl ReadOnlyBackend {
    pub fn new(inner: BackendHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StorageBackend for ReadOnlyBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        self.inner.exists(name).await
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        validate_name(from)?;
        validate_name(to)?;
        tracing::info!(from, to, "Skipping rename during read-only mode");
        Ok(())
    }
}
