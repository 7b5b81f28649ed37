use crate::Coordinate;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single remembered label.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub coordinate: Coordinate,
    pub label: String,
    /// Where the label came from, e.g. `nominatim_api`.
    pub source: String,
    pub timestamp: OffsetDateTime,
    /// Insertion order, breaks timestamp ties during eviction. Not persisted.
    pub(crate) seq: u64,
}

/// On-disk representation of a [`CacheEntry`].
///
/// Older cache files used `city`/`lat`/`lon` field names and naive ISO 8601
/// timestamps; both are still accepted on read.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoredEntry {
    #[serde(alias = "city")]
    pub label: String,
    #[serde(default)]
    pub source: String,
    #[serde(with = "timestamp")]
    pub timestamp: OffsetDateTime,
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon")]
    pub longitude: f64,
}

impl From<&CacheEntry> for StoredEntry {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            label: entry.label.clone(),
            source: entry.source.clone(),
            timestamp: entry.timestamp,
            latitude: entry.coordinate.latitude(),
            longitude: entry.coordinate.longitude(),
        }
    }
}

mod timestamp {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
    use time::format_description::well_known::{Iso8601, Rfc3339};
    use time::{OffsetDateTime, PrimitiveDateTime};

    pub fn serialize<S: Serializer>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        time::serde::rfc3339::serialize(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(parsed) = OffsetDateTime::parse(&raw, &Rfc3339) {
            return Ok(parsed);
        }
        // Naive timestamps carry no offset; treat them as UTC.
        PrimitiveDateTime::parse(&raw, &Iso8601::DEFAULT).map(PrimitiveDateTime::assume_utc).map_err(D::Error::custom)
    }
}
