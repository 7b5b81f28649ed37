use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use renamr_cache::{CacheStats, Coordinate, LoadOutcome, ProximityCache};
use renamr_geocode::LabelLookup;
use renamr_geocode::error::ErrorKind as GeocodeErrorKind;
use renamr_recovery::{Executor, RecoveryMethod};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{Instrument, Span};

/// Source recorded on cache entries written by [`Locator`].
pub const LOOKUP_SOURCE: &str = "nominatim_api";

/// Resolves coordinates to place labels: cache first, then the lookup
/// service under the executor's retry policy, then the fallback chain.
///
/// The cache sits behind an async mutex that is only ever held for a cache
/// operation, never across a lookup, so a `Locator` can be shared between
/// tasks resolving different coordinates.
pub struct Locator {
    cache: Mutex<ProximityCache>,
    lookup: Arc<dyn LabelLookup>,
    executor: Arc<Executor>,
    span: Span,
}

impl Locator {
    pub fn new(cache: ProximityCache, lookup: Arc<dyn LabelLookup>, executor: Arc<Executor>) -> Self {
        Self {
            cache: Mutex::new(cache),
            lookup,
            executor,
            span: Span::none(),
        }
    }

    /// Emit all events inside `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Place label for `coordinate`, and whether the cache supplied it.
    ///
    /// Never fails. A non-empty label from the lookup service is cached; an
    /// empty one is returned as-is and not cached. When every attempt fails,
    /// the cache is consulted once more (another task may have filled it in
    /// the meantime) and the answer degrades to an empty label if it has
    /// nothing either.
    pub async fn lookup_coordinate_label(&self, coordinate: Coordinate) -> (String, bool) {
        async {
            if let Some(label) = self.cached(&coordinate).await {
                tracing::debug!(label = %label, "Cache hit");
                return (label, true);
            }
            tracing::debug!("Cache miss; querying lookup service");

            let outcome =
                self.executor.retry_with_backoff("reverse geocode", || self.lookup.lookup(coordinate)).await;
            if outcome.success {
                let label = outcome.result;
                if !label.is_empty() {
                    self.cache.lock().await.put(coordinate, label.clone(), LOOKUP_SOURCE);
                }
                return (label, false);
            }

            let cached = self.cached(&coordinate).await;
            let context = format!("reverse geocode for {coordinate}");
            let fallback = match outcome.error.as_ref() {
                Some(error) => match &**error {
                    GeocodeErrorKind::MalformedResponse(raw) => self.executor.handle_malformed_response(&**error, raw),
                    kind => self.executor.handle_network_error(kind, &context, cached),
                },
                None => self.executor.handle_network_error(&"no attempts made", &context, cached),
            };
            (fallback.result, fallback.method == RecoveryMethod::CachedFallback)
        }
        .instrument(tracing::info_span!(parent: &self.span, "lookup_coordinate_label", coordinate = %coordinate))
        .await
    }

    async fn cached(&self, coordinate: &Coordinate) -> Option<String> {
        self.cache.lock().await.get(coordinate).map(str::to_string)
    }

    /// Persists the cache to its backing file.
    pub async fn save_cache(&self) -> Result<()> {
        self.cache.lock().await.save().or_raise(|| ErrorKind::Cache)
    }

    /// Reloads the cache from its backing file, discarding in-memory entries.
    pub async fn load_cache(&self) -> LoadOutcome {
        self.cache.lock().await.load()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.lock().await.stats()
    }

    /// Drops every cached label. The backing file is untouched until
    /// [`save_cache`](Self::save_cache).
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use renamr_cache::CacheOptions;
    use renamr_geocode::error::Result as GeocodeResult;
    use renamr_recovery::RetryPolicy;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Answers by latitude: 50.0 is Prague, 48.2 is empty, 10.0 is garbage,
    /// everything else is a network failure.
    #[derive(Default)]
    struct Scripted {
        calls: AtomicU32,
    }

    #[async_trait]
    impl LabelLookup for Scripted {
        async fn lookup(&self, coordinate: Coordinate) -> GeocodeResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let latitude = coordinate.latitude();
            if latitude == 50.0 {
                Ok("Prague".to_string())
            } else if latitude == 48.2 {
                Ok(String::new())
            } else if latitude == 10.0 {
                Err(exn::Exn::from(GeocodeErrorKind::MalformedResponse("<html>".to_string())))
            } else {
                Err(exn::Exn::from(GeocodeErrorKind::Network))
            }
        }
    }

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate::new(latitude, longitude).unwrap()
    }

    fn locator(lookup: Arc<Scripted>) -> Locator {
        let executor = Executor::new(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        });
        Locator::new(ProximityCache::in_memory(CacheOptions::default()), lookup, Arc::new(executor))
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_lookup_is_cached() {
        let lookup = Arc::new(Scripted::default());
        let locator = locator(lookup.clone());

        assert_eq!(locator.lookup_coordinate_label(coord(50.0, 14.4)).await, ("Prague".to_string(), false));
        // Within tolerance of the first lookup.
        assert_eq!(locator.lookup_coordinate_label(coord(50.0005, 14.4)).await, ("Prague".to_string(), true));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);

        let stats = locator.cache_stats().await;
        assert_eq!(stats.total_entries, 1);
        let cache = locator.cache.lock().await;
        assert_eq!(cache.find(&coord(50.0, 14.4), 0.0).unwrap().source, LOOKUP_SOURCE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_label_is_not_cached() {
        let lookup = Arc::new(Scripted::default());
        let locator = locator(lookup.clone());
        assert_eq!(locator.lookup_coordinate_label(coord(48.2, 16.4)).await, (String::new(), false));
        assert_eq!(locator.lookup_coordinate_label(coord(48.2, 16.4)).await, (String::new(), false));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
        assert_eq!(locator.cache_stats().await.total_entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_failure_degrades_to_empty_label() {
        let lookup = Arc::new(Scripted::default());
        let locator = locator(lookup.clone());
        let start = tokio::time::Instant::now();
        assert_eq!(locator.lookup_coordinate_label(coord(1.0, 1.0)).await, (String::new(), false));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        // One failed retry run, one successful (degraded) fallback.
        let stats = locator.executor().stats();
        assert_eq!((stats.total, stats.successful, stats.failed), (2, 1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_response_continues_without_label() {
        let lookup = Arc::new(Scripted::default());
        let locator = locator(lookup.clone());
        assert_eq!(locator.lookup_coordinate_label(coord(10.0, 10.0)).await, (String::new(), false));
        assert_eq!(locator.cache_stats().await.total_entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_lookup_falls_back_to_label_cached_meanwhile() {
        let lookup = Arc::new(Scripted::default());
        let locator = locator(lookup.clone());
        // Both miss the cache. The failing one is still backing off when the
        // other caches "Prague" for a coordinate within tolerance.
        let (failing, succeeding) = tokio::join!(
            locator.lookup_coordinate_label(coord(50.0008, 14.4)),
            locator.lookup_coordinate_label(coord(50.0, 14.4)),
        );
        assert_eq!(succeeding, ("Prague".to_string(), false));
        assert_eq!(failing, ("Prague".to_string(), true));
    }

    #[tokio::test]
    async fn test_save_and_load_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("city_cache.json");
        let (cache, _) = ProximityCache::open(&path, CacheOptions::default());
        let locator = Locator::new(cache, Arc::new(Scripted::default()), Arc::new(Executor::default()));
        locator.lookup_coordinate_label(coord(50.0, 14.4)).await;
        locator.save_cache().await.unwrap();

        locator.clear_cache().await;
        assert_eq!(locator.cache_stats().await.total_entries, 0);
        assert!(locator.load_cache().await.is_success());
        assert_eq!(locator.lookup_coordinate_label(coord(50.0, 14.4)).await, ("Prague".to_string(), true));
        assert!(locator.cache_stats().await.file_exists);
    }
}
