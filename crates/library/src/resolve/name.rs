/// Desired name given to files without usable metadata.
pub const NO_METADATA: &str = "No metadata";
/// Desired names starting with this mark files whose metadata couldn't be read.
pub const ERROR_PREFIX: &str = "Error";

/// The two desired names that are never resolved, only passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// [`NO_METADATA`]: the file gets an underscore prefix instead of a new name.
    NoMetadata,
    /// Starts with [`ERROR_PREFIX`]: the file is left alone.
    Error,
}

impl Placeholder {
    pub fn classify(name: &str) -> Option<Self> {
        if name == NO_METADATA {
            Some(Self::NoMetadata)
        } else if name.starts_with(ERROR_PREFIX) {
            Some(Self::Error)
        } else {
            None
        }
    }
}

/// Splits `name` into stem and extension (dot included).
///
/// The extension starts at the last dot, unless everything before that dot
/// is also dots: `".bashrc"` has no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) if name[..index].chars().any(|c| c != '.') => name.split_at(index),
        _ => (name, ""),
    }
}

/// Inserts `suffix` before the extension of `name`.
pub fn with_suffix(name: &str, suffix: &str) -> String {
    let (stem, extension) = split_extension(name);
    format!("{stem}{suffix}{extension}")
}
