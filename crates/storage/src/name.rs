//! File name validation.
//!
//! Backends operate on a single directory, so a valid name is exactly one
//! normal path component.

use crate::error::{ErrorKind, Result};
use std::path::{Component, Path};

/// Validates that `name` refers to a file directly inside the backend's
/// directory.
///
/// Rejects empty names, `.` and `..`, anything containing a path separator,
/// and names containing null bytes (they truncate in C-based syscalls).
///
/// # Examples
///
/// ```
/// use renamr_storage::validate_name;
/// assert!(validate_name("IMG_0001.jpg").is_ok());
/// assert!(validate_name(".hidden").is_ok());
/// assert!(validate_name("../escape.jpg").is_err());
/// assert!(validate_name("sub/dir.jpg").is_err());
/// assert!(validate_name("").is_err());
/// ```
pub fn validate(name: &str) -> Result<&str> {
    if name.contains('\0') || name.contains('/') || name.contains('\\') {
        exn::bail!(ErrorKind::InvalidName(name.to_string()));
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => exn::bail!(ErrorKind::InvalidName(name.to_string())),
    }
}
