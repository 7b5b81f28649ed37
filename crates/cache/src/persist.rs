//! Reading and writing the cache document.

use crate::entry::StoredEntry;
use crate::error::{ErrorKind, Result, io_error};
use exn::ResultExt;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use time::OffsetDateTime;
use time::macros::format_description;

/// What happened when a cache file was loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No cache file (or no path configured); the cache starts empty.
    Missing,
    /// The file was read. Entries that failed validation were dropped.
    Loaded { entries: usize, skipped: usize },
    /// The file could not be read or parsed. It was copied aside (when
    /// possible) and the cache was reset to empty.
    Reset { backup: Option<PathBuf> },
}

impl LoadOutcome {
    /// `false` only when the cache had to be reset.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Reset { .. })
    }
}

/// Raw document contents, keyed by coordinate key. Values are left untyped so
/// one bad entry doesn't invalidate the rest.
pub(crate) fn read_document(path: &Path) -> Result<Option<BTreeMap<String, serde_json::Value>>> {
    let contents = match std::fs::read(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).or_raise(io_error(path)),
    };
    let document = serde_json::from_slice(&contents).or_raise(|| ErrorKind::InvalidData)?;
    Ok(Some(document))
}

pub(crate) fn parse_entry(key: &str, value: serde_json::Value) -> Option<StoredEntry> {
    match serde_json::from_value::<StoredEntry>(value) {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::debug!(key, error = %e, "Skipping invalid cache entry");
            None
        },
    }
}

/// Writes the document to a sibling temporary file, then renames it over
/// `path`. Readers see either the old or the new document, never a partial one.
pub(crate) fn write_document(path: &Path, document: &BTreeMap<String, StoredEntry>) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).or_raise(io_error(path))?;
    let json = serde_json::to_vec_pretty(document).or_raise(|| ErrorKind::InvalidData)?;
    let mut temp = NamedTempFile::new_in(parent).or_raise(io_error(path))?;
    temp.write_all(&json).or_raise(io_error(path))?;
    temp.as_file().sync_all().or_raise(io_error(path))?;
    temp.persist(path).map_err(|e| e.error).or_raise(io_error(path))?;
    Ok(())
}

/// Copies an unreadable cache file to `{stem}_corrupted_{YYYYmmdd_HHMMSS}.json`
/// next to the original.
pub(crate) fn backup_corrupted(path: &Path) -> Result<PathBuf> {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "cache".to_string());
    let stamp = OffsetDateTime::now_utc()
        .format(format_description!("[year][month][day]_[hour][minute][second]"))
        .or_raise(|| ErrorKind::InvalidData)?;
    let backup = path.with_file_name(format!("{stem}_corrupted_{stamp}.json"));
    std::fs::copy(path, &backup).or_raise(io_error(&backup))?;
    Ok(backup)
}
