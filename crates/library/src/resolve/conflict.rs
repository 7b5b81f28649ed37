use crate::error::{ErrorKind, Result, from_storage};
use crate::resolve::name::with_suffix;
use renamr_storage::BackendHandle;
use std::collections::HashSet;

/// Highest `_cN` suffix tried before giving up with [`ErrorKind::Conflict`].
const MAX_CONFLICT_SUFFIX: u32 = 10_000;

/// Finds names that are free in a backend's directory.
///
/// Besides the files on disk, a resolver remembers names it has been told
/// are spoken for with [`reserve`](Self::reserve), so names handed out
/// earlier in the same batch are treated as taken too.
///
/// Answers are only as good as the moment they were given: the directory can
/// change before the rename happens, which is why the rename executor asks
/// again immediately before acting.
pub struct ConflictResolver<'a> {
    backend: &'a BackendHandle,
    reserved: HashSet<String>,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(backend: &'a BackendHandle) -> Self {
        Self {
            backend,
            reserved: HashSet::new(),
        }
    }

    /// Treat `name` as taken from now on.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.reserved.insert(name.into());
    }

    /// Returns `name` if it is free, otherwise the first free `_cN` variant.
    ///
    /// # Errors
    /// Propagates a failed existence check (e.g. permission denied on the
    /// directory) and raises [`ErrorKind::Conflict`] when no suffix up to the
    /// search limit is free.
    pub async fn resolve_conflict(&self, name: &str) -> Result<String> {
        if !self.is_taken(name).await? {
            return Ok(name.to_string());
        }
        self.find_available_name(name).await
    }

    /// Searches `_c1`, `_c2`, … (before the extension) and returns the lowest
    /// one that is free, regardless of any gaps in the existing numbering.
    pub async fn find_available_name(&self, name: &str) -> Result<String> {
        for counter in 1..=MAX_CONFLICT_SUFFIX {
            let candidate = with_suffix(name, &format!("_c{counter}"));
            if !self.is_taken(&candidate).await? {
                tracing::debug!(backend = %self.backend.name(), name, available = %candidate, "Resolved name conflict");
                return Ok(candidate);
            }
        }
        tracing::error!(backend = %self.backend.name(), name, "No available name within the suffix limit");
        exn::bail!(ErrorKind::Conflict(name.to_string()));
    }

    async fn is_taken(&self, name: &str) -> Result<bool> {
        if self.reserved.contains(name) {
            return Ok(true);
        }
        self.backend.exists(name).await.map_err(from_storage)
    }
}
