//! The names file: the batch a caller wants renamed.
//!
//! A JSON array of entries, one per file:
//!
//! ```json
//! [
//!   { "original": "IMG_0001.jpg", "desired": "2024-05-01_{label}.jpg", "latitude": 50.08, "longitude": 14.43 },
//!   { "original": "IMG_0002.jpg", "desired": "No metadata", "selected": false }
//! ]
//! ```
//!
//! `{label}` in `desired` is replaced with the place label for the entry's
//! coordinates.

use crate::error::{ErrorKind, Result};
use crate::video::{VideoLocator, is_video};
use exn::ResultExt;
use renamr_cache::Coordinate;
use renamr_library::resolve::NO_METADATA;
use renamr_library::{FileRecord, Locator};
use serde::Deserialize;
use std::path::Path;

pub const LABEL_PLACEHOLDER: &str = "{label}";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameEntry {
    pub original: String,
    pub desired: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default = "selected_by_default")]
    pub selected: bool,
}

fn selected_by_default() -> bool {
    true
}

impl NameEntry {
    /// Both coordinates, validated; `None` when the entry has neither.
    pub fn coordinate(&self) -> std::result::Result<Option<Coordinate>, String> {
        match (self.latitude, self.longitude) {
            (None, None) => Ok(None),
            (Some(latitude), Some(longitude)) => Coordinate::new(latitude, longitude)
                .map(Some)
                .map_err(|e| format!("{}: {}", self.original, *e)),
            _ => Err(format!("{}: latitude and longitude must be given together", self.original)),
        }
    }
}

pub fn read_names(path: &Path) -> Result<Vec<NameEntry>> {
    let invalid = |message: String| ErrorKind::Names(path.to_path_buf(), message);
    let contents = std::fs::read(path).or_raise(|| invalid("could not read file".to_string()))?;
    let entries: Vec<NameEntry> =
        serde_json::from_slice(&contents).or_raise(|| invalid("not a JSON array of entries".to_string()))?;
    for entry in &entries {
        entry.coordinate().map_err(|message| exn::Exn::from(invalid(message)))?;
    }
    Ok(entries)
}

/// Replaces the label placeholder in `desired`. An empty label takes one
/// adjoining `_` or space with it, so `2024_{label}.jpg` becomes `2024.jpg`.
/// When the label was the whole stem (`{label}.jpg`), there is no name left
/// to give and the result is the [`NO_METADATA`] placeholder.
pub fn fill_label(desired: &str, label: &str) -> String {
    if !label.is_empty() || !desired.contains(LABEL_PLACEHOLDER) {
        return desired.replace(LABEL_PLACEHOLDER, label);
    }
    let filled = ["_", " "]
        .iter()
        .flat_map(|sep| [format!("{sep}{LABEL_PLACEHOLDER}"), format!("{LABEL_PLACEHOLDER}{sep}")])
        .chain([LABEL_PLACEHOLDER.to_string()])
        .fold(desired.to_string(), |name, pattern| name.replace(&pattern, ""));
    if filled.is_empty() || filled.starts_with('.') {
        return NO_METADATA.to_string();
    }
    filled
}

/// Turns entries into records for `directory`, looking up a label for each
/// entry that uses the placeholder. Coordinates come from the entry, or for a
/// video without them, from the video itself.
///
/// Lookups run one at a time so the service sees at most one request per
/// file; repeated coordinates are answered by the cache.
pub async fn into_records(
    entries: Vec<NameEntry>,
    directory: &Path,
    locator: &Locator,
    videos: &VideoLocator,
) -> Vec<FileRecord> {
    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        let wants_label = entry.desired.contains(LABEL_PLACEHOLDER);
        // Validated by `read_names`.
        let mut coordinate = entry.coordinate().ok().flatten();
        if coordinate.is_none() && wants_label && is_video(&entry.original) {
            coordinate = videos.coordinate(&directory.join(&entry.original)).await;
        }
        let mut label = String::new();
        if let Some(coordinate) = coordinate
            && wants_label
        {
            (label, _) = locator.lookup_coordinate_label(coordinate).await;
        }
        let mut record = FileRecord::new(directory, entry.original, fill_label(&entry.desired, &label))
            .with_selected(entry.selected);
        if let Some(coordinate) = coordinate {
            record = record.with_coordinate(coordinate);
        }
        record.label = label;
        records.push(record);
    }
    records
}
