//! Rename execution.
//!
//! Takes the output of [`resolve_batch`](crate::resolve_batch) and renames
//! the files. The primary entry point is [`rename_batch`], which streams one
//! [`Action`] per selected record; [`BatchReport::collect`] turns that stream
//! into totals and a per-file log. XMP sidecars are renamed along with their
//! files.

mod file;
mod report;
mod sidecar;
mod stream;

pub use self::file::{Action, rename_file};
pub use self::report::{BatchReport, OperationLog, Status};
pub use self::stream::{RenameEvent, rename_batch};
