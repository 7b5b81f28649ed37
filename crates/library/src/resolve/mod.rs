//! Turning desired names into safe ones.
//!
//! Resolution happens in two passes. [`resolve_duplicates`] makes the names
//! unique within a batch without looking at the filesystem (`_001`, `_002`,
//! …). [`ConflictResolver`] then checks each name against the target
//! directory and picks the lowest free `_cN` variant when it is taken.
//!
//! Two kinds of desired name are never resolved: the [`NO_METADATA`]
//! placeholder and anything starting with [`ERROR_PREFIX`]. See
//! [`Placeholder`].

mod conflict;
mod duplicate;
mod name;

pub use self::conflict::ConflictResolver;
pub use self::duplicate::resolve_duplicates;
pub use self::name::{ERROR_PREFIX, NO_METADATA, Placeholder, split_extension, with_suffix};
