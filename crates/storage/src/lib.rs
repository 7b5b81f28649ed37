//! Directory-scoped storage for batch renames.
//!
//! Every backend represents a single directory. Files are addressed by plain
//! file names (never paths), which are checked with [`validate_name`] before
//! they reach the filesystem.

pub mod backend;
pub mod error;
mod name;

pub use crate::backend::StorageBackend;
pub use crate::name::validate as validate_name;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
