//! Batch rename planning and execution.
//!
//! A batch goes through two stages. [`resolve_batch`] gives every
//! [`FileRecord`] a final name that is unique within the batch and free in the
//! target directory. [`rename::rename_batch`] then performs the renames,
//! checking the directory again immediately before each one. Place labels for
//! the desired names come from a [`Locator`], which puts a proximity cache and
//! a retry/fallback chain in front of the lookup service.

pub mod error;
mod locate;
mod plan;
mod record;
pub mod rename;
pub mod resolve;

pub use crate::locate::{LOOKUP_SOURCE, Locator};
pub use crate::plan::{Planned, resolve_batch};
pub use crate::record::FileRecord;
use renamr_recovery::Executor;
use std::sync::Arc;

/// Shared state for rename execution.
#[derive(Debug, Default, Clone)]
pub struct Context {
    /// Fallback chain for per-file failures. Usually the same executor the
    /// [`Locator`] uses, so [`Executor::stats`] covers the whole run.
    pub executor: Arc<Executor>,
}

impl Context {
    pub fn new(executor: Arc<Executor>) -> Self {
        Self { executor }
    }
}
