//! Reverse geocoding: turning a photo's coordinate into a place label.
//!
//! [`LabelLookup`] is the seam the rest of renamr depends on. It is always
//! called through a retry executor, never in a loop of its own.
//! [`NominatimClient`] implements it against OpenStreetMap's Nominatim API.

mod clean;
pub mod error;
mod lookup;
mod nominatim;

pub use crate::clean::clean_label;
pub use crate::lookup::LabelLookup;
pub use crate::nominatim::{DEFAULT_ENDPOINT, NominatimClient, NominatimOptions, parse_label};
