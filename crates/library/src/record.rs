use crate::resolve::Placeholder;
use renamr_cache::Coordinate;
use std::path::PathBuf;

/// One file in a rename batch.
///
/// Created by whatever discovered the file, with `desired_name` already
/// generated from its metadata. Planning fills in `final_name`; the rename
/// executor consumes the result.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// Current file name within the batch directory.
    pub original_name: String,
    /// Full path of the file, used in log output and error reports.
    pub original_path: PathBuf,
    pub desired_name: String,
    /// Unique, non-colliding name; `None` until the batch has been planned.
    pub final_name: Option<String>,
    pub coordinate: Option<Coordinate>,
    /// Place label looked up for `coordinate` (empty if none).
    pub label: String,
    pub has_metadata: bool,
    /// Unselected records are planned but never renamed.
    pub selected: bool,
}

impl FileRecord {
    /// A selected record for `original_name` inside `directory`.
    pub fn new(directory: impl Into<PathBuf>, original_name: impl Into<String>, desired_name: impl Into<String>) -> Self {
        let original_name = original_name.into();
        let desired_name = desired_name.into();
        Self {
            original_path: directory.into().join(&original_name),
            has_metadata: Placeholder::classify(&desired_name).is_none(),
            original_name,
            desired_name,
            final_name: None,
            coordinate: None,
            label: String::new(),
            selected: true,
        }
    }

    pub fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// The name the file should end up with: `final_name` once planned,
    /// `desired_name` before.
    pub fn target_name(&self) -> &str {
        self.final_name.as_deref().unwrap_or(&self.desired_name)
    }

    pub fn placeholder(&self) -> Option<Placeholder> {
        Placeholder::classify(&self.desired_name)
    }
}
