use crate::entry::{CacheEntry, StoredEntry};
use crate::error::Result;
use crate::persist::{self, LoadOutcome};
use crate::{Coordinate, DEFAULT_MAX_ENTRIES, DEFAULT_TOLERANCE};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::instrument;

/// Construction parameters for a [`ProximityCache`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheOptions {
    /// Backing file. `None` keeps the cache in memory only.
    pub path: Option<PathBuf>,
    /// Upper bound on stored entries (at least 1).
    pub max_entries: usize,
    /// Default per-axis matching tolerance, in degrees.
    pub tolerance: f64,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            path: None,
            max_entries: DEFAULT_MAX_ENTRIES,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Snapshot of cache state for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub max_entries: usize,
    pub cache_file: Option<PathBuf>,
    pub file_exists: bool,
    pub tolerance: f64,
}

/// Bounded map from coordinates to place labels with tolerance matching.
///
/// Lookups try the exact 6-decimal key first, then scan entries in key order
/// and return the first one within tolerance on both axes. Lookups never
/// mutate the cache; recency only changes when an entry is written.
///
/// Not internally synchronized: wrap it in a mutex to share it.
///
/// # Examples
///
/// ```
/// use renamr_cache::{CacheOptions, Coordinate, ProximityCache};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut cache = ProximityCache::in_memory(CacheOptions::default());
/// cache.put(Coordinate::new(50.0755, 14.4378)?, "Prague", "manual");
///
/// let nearby = Coordinate::new(50.0758, 14.4371)?;
/// assert_eq!(cache.get(&nearby), Some("Prague"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ProximityCache {
    options: CacheOptions,
    entries: BTreeMap<String, CacheEntry>,
    next_seq: u64,
}

impl ProximityCache {
    /// Create an empty cache that is never persisted.
    pub fn in_memory(options: CacheOptions) -> Self {
        Self::new(CacheOptions { path: None, ..options })
    }

    /// Create a cache backed by `path` and load it.
    ///
    /// Never fails: an unreadable file is reported through the returned
    /// [`LoadOutcome`] and the cache starts empty.
    pub fn open(path: impl Into<PathBuf>, options: CacheOptions) -> (Self, LoadOutcome) {
        let mut cache = Self::new(CacheOptions {
            path: Some(path.into()),
            ..options
        });
        let outcome = cache.load();
        (cache, outcome)
    }

    fn new(options: CacheOptions) -> Self {
        let max_entries = options.max_entries.max(1);
        Self {
            options: CacheOptions { max_entries, ..options },
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub fn path(&self) -> Option<&Path> {
        self.options.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Label cached for `coordinate`, using the configured tolerance.
    pub fn get(&self, coordinate: &Coordinate) -> Option<&str> {
        self.find(coordinate, self.options.tolerance).map(|entry| entry.label.as_str())
    }

    /// Entry matching `coordinate` within `tolerance`.
    ///
    /// An exact key match wins; otherwise the first entry in key order that
    /// is within tolerance on both axes. Not necessarily the nearest.
    pub fn find(&self, coordinate: &Coordinate, tolerance: f64) -> Option<&CacheEntry> {
        if let Some(entry) = self.entries.get(&coordinate.key()) {
            return Some(entry);
        }
        self.entries.values().find(|entry| entry.coordinate.is_within(coordinate, tolerance))
    }

    /// Whether any entry lies within `tolerance` (default: the configured one).
    pub fn contains_within(&self, coordinate: &Coordinate, tolerance: Option<f64>) -> bool {
        self.find(coordinate, tolerance.unwrap_or(self.options.tolerance)).is_some()
    }

    /// Stores `label` under the coordinate's key, stamped with the current
    /// time, then evicts the oldest entries beyond `max_entries`. The entry
    /// just written always survives eviction.
    pub fn put(&mut self, coordinate: Coordinate, label: impl Into<String>, source: impl Into<String>) {
        self.put_at(coordinate, label, source, OffsetDateTime::now_utc());
    }

    pub(crate) fn put_at(
        &mut self,
        coordinate: Coordinate,
        label: impl Into<String>,
        source: impl Into<String>,
        timestamp: OffsetDateTime,
    ) {
        let key = coordinate.key();
        let entry = CacheEntry {
            coordinate,
            label: label.into(),
            source: source.into(),
            timestamp,
            seq: self.bump_seq(),
        };
        tracing::trace!(key = %key, label = %entry.label, "Caching label");
        self.entries.insert(key.clone(), entry);
        self.evict(Some(&key));
    }

    /// Removes every entry. Does not touch the backing file until [`save`](Self::save).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.entries.len(),
            max_entries: self.options.max_entries,
            cache_file: self.options.path.clone(),
            file_exists: self.options.path.as_deref().is_some_and(Path::exists),
            tolerance: self.options.tolerance,
        }
    }

    /// Replaces the in-memory entries with the backing file's contents.
    ///
    /// Invalid entries are skipped. A file that can't be read or parsed is
    /// copied aside (best effort) and the cache is reset to empty.
    #[instrument(skip_all, fields(path = ?self.options.path))]
    pub fn load(&mut self) -> LoadOutcome {
        let Some(path) = self.options.path.clone() else {
            return LoadOutcome::Missing;
        };
        let document = match persist::read_document(&path) {
            Ok(Some(document)) => document,
            Ok(None) => {
                tracing::debug!("No cache file; starting empty");
                self.entries.clear();
                return LoadOutcome::Missing;
            },
            Err(e) => {
                tracing::warn!(error = %*e, "Cache file unreadable; resetting");
                let backup = match persist::backup_corrupted(&path) {
                    Ok(backup) => {
                        tracing::info!(backup = %backup.display(), "Backed up corrupted cache file");
                        Some(backup)
                    },
                    Err(e) => {
                        tracing::warn!(error = %*e, "Could not back up corrupted cache file");
                        None
                    },
                };
                self.entries.clear();
                return LoadOutcome::Reset { backup };
            },
        };

        let mut loaded: Vec<(Coordinate, StoredEntry)> = Vec::with_capacity(document.len());
        let mut skipped = 0;
        for (key, value) in document {
            match persist::parse_entry(&key, value)
                .and_then(|stored| Coordinate::new(stored.latitude, stored.longitude).ok().map(|c| (c, stored)))
            {
                Some(pair) => loaded.push(pair),
                None => skipped += 1,
            }
        }
        // Oldest first, so insertion order matches recency for tie-breaking.
        loaded.sort_by_key(|(_, stored)| stored.timestamp);

        self.entries.clear();
        for (coordinate, stored) in loaded {
            let seq = self.bump_seq();
            self.entries.insert(
                coordinate.key(),
                CacheEntry {
                    coordinate,
                    label: stored.label,
                    source: stored.source,
                    timestamp: stored.timestamp,
                    seq,
                },
            );
        }
        self.evict(None);
        tracing::debug!(entries = self.entries.len(), skipped, "Loaded cache file");
        LoadOutcome::Loaded {
            entries: self.entries.len(),
            skipped,
        }
    }

    /// Writes all entries to the backing file atomically. A no-op for
    /// in-memory caches.
    #[instrument(skip_all, fields(path = ?self.options.path))]
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.options.path else {
            return Ok(());
        };
        let document: BTreeMap<String, StoredEntry> =
            self.entries.iter().map(|(key, entry)| (key.clone(), StoredEntry::from(entry))).collect();
        persist::write_document(path, &document)?;
        tracing::debug!(entries = document.len(), "Saved cache file");
        Ok(())
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn evict(&mut self, keep: Option<&str>) {
        let excess = self.entries.len().saturating_sub(self.options.max_entries);
        if excess == 0 {
            return;
        }
        let mut candidates: Vec<_> = self
            .entries
            .iter()
            .filter(|(key, _)| Some(key.as_str()) != keep)
            .map(|(key, entry)| (entry.timestamp, entry.seq, key.clone()))
            .collect();
        candidates.sort_unstable();
        for (_, _, key) in candidates.into_iter().take(excess) {
            tracing::trace!(key = %key, "Evicting cache entry");
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::datetime;

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate::new(latitude, longitude).unwrap()
    }

    fn options(max_entries: usize) -> CacheOptions {
        CacheOptions {
            max_entries,
            ..CacheOptions::default()
        }
    }

    #[test]
    fn test_exact_and_proximity_hits() {
        let mut cache = ProximityCache::in_memory(CacheOptions::default());
        cache.put(coord(50.0755, 14.4378), "Prague", "test");
        assert_eq!(cache.get(&coord(50.0755, 14.4378)), Some("Prague"));
        assert_eq!(cache.get(&coord(50.0755 + 0.001, 14.4378 - 0.001)), Some("Prague"));
        assert_eq!(cache.get(&coord(50.0755 + 0.002, 14.4378)), None);
        assert_eq!(cache.get(&coord(50.0755, 14.4378 + 0.0011)), None);
    }

    #[test]
    fn test_exact_key_beats_earlier_proximity_match() {
        let mut cache = ProximityCache::in_memory(CacheOptions::default());
        cache.put(coord(10.0000, 10.0000), "First", "test");
        cache.put(coord(10.0005, 10.0005), "Second", "test");
        assert_eq!(cache.get(&coord(10.0005, 10.0005)), Some("Second"));
        // Within tolerance of both: first in key order wins.
        assert_eq!(cache.get(&coord(10.0003, 10.0003)), Some("First"));
    }

    #[test]
    fn test_get_does_not_touch_recency() {
        let mut cache = ProximityCache::in_memory(CacheOptions::default());
        let stamp = datetime!(2024-01-01 00:00:00 UTC);
        cache.put_at(coord(1.0, 1.0), "One", "test", stamp);
        for _ in 0..3 {
            cache.get(&coord(1.0, 1.0));
        }
        assert_eq!(cache.find(&coord(1.0, 1.0), 0.0).unwrap().timestamp, stamp);
    }

    #[test]
    fn test_contains_within_custom_tolerance() {
        let mut cache = ProximityCache::in_memory(CacheOptions::default());
        cache.put(coord(0.0, 0.0), "Null Island", "test");
        assert!(cache.contains_within(&coord(0.0, 0.0), None));
        assert!(!cache.contains_within(&coord(0.005, 0.0), None));
        assert!(cache.contains_within(&coord(0.005, 0.0), Some(0.01)));
    }

    #[test]
    fn test_put_replaces_same_key() {
        let mut cache = ProximityCache::in_memory(CacheOptions::default());
        cache.put(coord(1.0, 2.0), "Old", "test");
        cache.put(coord(1.0000001, 2.0), "New", "test");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&coord(1.0, 2.0)), Some("New"));
    }

    #[test]
    fn test_eviction_keeps_most_recent() {
        let mut cache = ProximityCache::in_memory(options(2));
        let base = datetime!(2024-01-01 00:00:00 UTC);
        cache.put_at(coord(1.0, 1.0), "One", "test", base);
        cache.put_at(coord(2.0, 2.0), "Two", "test", base + Duration::hours(1));
        cache.put_at(coord(3.0, 3.0), "Three", "test", base + Duration::hours(2));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&coord(1.0, 1.0)), None);
        assert_eq!(cache.get(&coord(2.0, 2.0)), Some("Two"));
        assert_eq!(cache.get(&coord(3.0, 3.0)), Some("Three"));
    }

    #[test]
    fn test_eviction_never_drops_new_entry() {
        let mut cache = ProximityCache::in_memory(options(1));
        let base = datetime!(2024-01-01 00:00:00 UTC);
        cache.put_at(coord(1.0, 1.0), "Newer", "test", base);
        // Stamped earlier than the existing entry, but it's the one just written.
        cache.put_at(coord(2.0, 2.0), "Older", "test", base - Duration::days(1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&coord(2.0, 2.0)), Some("Older"));
    }

    #[test]
    fn test_eviction_ties_break_by_insertion_order() {
        let mut cache = ProximityCache::in_memory(options(2));
        let stamp = datetime!(2024-01-01 00:00:00 UTC);
        cache.put_at(coord(3.0, 3.0), "A", "test", stamp);
        cache.put_at(coord(1.0, 1.0), "B", "test", stamp);
        cache.put_at(coord(2.0, 2.0), "C", "test", stamp);
        assert_eq!(cache.get(&coord(3.0, 3.0)), None);
        assert_eq!(cache.get(&coord(1.0, 1.0)), Some("B"));
        assert_eq!(cache.get(&coord(2.0, 2.0)), Some("C"));
    }

    #[test]
    fn test_size_bound_holds() {
        let mut cache = ProximityCache::in_memory(options(5));
        for i in 0..20 {
            cache.put(coord(f64::from(i), 0.0), format!("Place {i}"), "test");
            assert!(cache.len() <= 5);
        }
        assert_eq!(cache.get(&coord(19.0, 0.0)), Some("Place 19"));
    }

    #[test]
    fn test_clear_and_stats() {
        let mut cache = ProximityCache::in_memory(CacheOptions::default());
        cache.put(coord(1.0, 1.0), "One", "test");
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.max_entries, DEFAULT_MAX_ENTRIES);
        assert_eq!(stats.cache_file, None);
        assert!(!stats.file_exists);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_save_and_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("city_cache.json");
        let (mut cache, outcome) = ProximityCache::open(&path, CacheOptions::default());
        assert_eq!(outcome, LoadOutcome::Missing);
        cache.put(coord(48.2082, 16.3738), "Vienna", "nominatim_api");
        cache.put(coord(50.0755, 14.4378), "Prague", "nominatim_api");
        cache.save().unwrap();
        assert!(cache.stats().file_exists);

        let (reopened, outcome) = ProximityCache::open(&path, CacheOptions::default());
        assert_eq!(outcome, LoadOutcome::Loaded { entries: 2, skipped: 0 });
        assert_eq!(reopened.get(&coord(48.2082, 16.3738)), Some("Vienna"));
        let entry = reopened.find(&coord(50.0755, 14.4378), 0.0).unwrap();
        assert_eq!(entry.source, "nominatim_api");
    }

    #[test]
    fn test_load_skips_invalid_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("city_cache.json");
        std::fs::write(
            &path,
            r#"{
                "50.075500,14.437800": {"label": "Prague", "source": "nominatim_api", "timestamp": "2024-01-01T00:00:00Z", "latitude": 50.0755, "longitude": 14.4378},
                "missing,fields": {"label": "Nowhere"},
                "999.000000,0.000000": {"label": "Bad", "source": "x", "timestamp": "2024-01-01T00:00:00Z", "latitude": 999.0, "longitude": 0.0},
                "not-an-object": 42
            }"#,
        )
        .unwrap();
        let (cache, outcome) = ProximityCache::open(&path, CacheOptions::default());
        assert_eq!(outcome, LoadOutcome::Loaded { entries: 1, skipped: 3 });
        assert!(outcome.is_success());
        assert_eq!(cache.get(&coord(50.0755, 14.4378)), Some("Prague"));
    }

    #[test]
    fn test_load_trims_to_max_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("city_cache.json");
        let (mut cache, _) = ProximityCache::open(&path, CacheOptions::default());
        let base = datetime!(2024-01-01 00:00:00 UTC);
        for i in 0..4 {
            cache.put_at(coord(f64::from(i), 0.0), format!("Place {i}"), "test", base + Duration::minutes(i.into()));
        }
        cache.save().unwrap();
        let (smaller, outcome) = ProximityCache::open(&path, options(2));
        assert_eq!(outcome, LoadOutcome::Loaded { entries: 2, skipped: 0 });
        assert_eq!(smaller.get(&coord(0.0, 0.0)), None);
        assert_eq!(smaller.get(&coord(3.0, 0.0)), Some("Place 3"));
    }

    #[test]
    fn test_corrupted_file_is_backed_up_and_reset() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("city_cache.json");
        std::fs::write(&path, b"{ this is not json").unwrap();
        let (mut cache, outcome) = ProximityCache::open(&path, CacheOptions::default());
        assert!(!outcome.is_success());
        let LoadOutcome::Reset { backup: Some(backup) } = outcome else {
            panic!("expected reset with backup, got {outcome:?}");
        };
        assert!(backup.exists());
        assert!(cache.is_empty());

        // The cache is usable and overwrites the corrupted file on save.
        cache.put(coord(1.0, 1.0), "One", "test");
        cache.save().unwrap();
        let (reopened, outcome) = ProximityCache::open(&path, CacheOptions::default());
        assert!(outcome.is_success());
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_in_memory_save_is_noop() {
        let cache = ProximityCache::in_memory(CacheOptions {
            path: Some(PathBuf::from("/should/not/be/written.json")),
            ..CacheOptions::default()
        });
        assert!(cache.path().is_none());
        cache.save().unwrap();
    }
}
