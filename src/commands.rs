use crate::error::{ErrorKind, Result};
use crate::names::{into_records, read_names};
use crate::video::VideoLocator;
use exn::ResultExt;
use renamr_cache::{CacheStats, Coordinate, LoadOutcome, ProximityCache};
use renamr_config::Config;
use renamr_geocode::NominatimClient;
use renamr_library::rename::{BatchReport, Status, rename_batch};
use renamr_library::{Context, Locator, Planned, resolve_batch};
use renamr_recovery::{Executor, ToolProbe};
use renamr_storage::BackendHandle;
use renamr_storage::backend::{LocalBackend, ReadOnlyBackend};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Everything a command needs, built once per invocation.
pub struct App {
    locator: Locator,
    executor: Arc<Executor>,
    videos: VideoLocator,
}

impl App {
    pub fn new(locator: Locator, executor: Arc<Executor>, videos: VideoLocator) -> Self {
        Self {
            locator,
            executor,
            videos,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let executor = Arc::new(Executor::new(config.retry_policy()).with_span(tracing::info_span!("recovery")));
        let (cache, outcome) = ProximityCache::open(config.cache.path.clone(), config.cache_options());
        match &outcome {
            LoadOutcome::Reset { backup } => {
                tracing::warn!(path = %config.cache.path.display(), ?backup, "Label cache was unreadable and has been reset");
            },
            outcome => tracing::debug!(path = %config.cache.path.display(), ?outcome, "Opened label cache"),
        }
        let client = NominatimClient::new(config.nominatim_options()).or_raise(|| ErrorKind::Lookup)?;
        let locator = Locator::new(cache, Arc::new(client), executor.clone()).with_span(tracing::info_span!("locate"));
        let probe = ToolProbe::new(config.probe.tool.clone()).with_timeout(config.probe_timeout());
        Ok(Self::new(locator, executor, VideoLocator::new(probe)))
    }

    /// Plans the batch and prints `original -> final` per file.
    pub async fn plan(&self, directory: &Path, names: &Path, out: &mut impl Write) -> Result<Vec<Planned>> {
        let backend = backend(directory, true)?;
        let planned = self.resolve(&backend, directory, names).await?;
        for plan in &planned {
            let record = plan.record();
            let line = match plan {
                Planned::Failed(_, error) => writeln!(out, "{} -> (failed: {})", record.original_name, **error),
                _ if !record.selected => writeln!(out, "{} -> {} (not selected)", record.original_name, record.target_name()),
                _ => writeln!(out, "{} -> {}", record.original_name, record.target_name()),
            };
            line.or_raise(|| ErrorKind::Output)?;
        }
        self.persist_cache().await;
        Ok(planned)
    }

    /// Plans and renames the batch, then prints the report.
    pub async fn apply(
        &self,
        directory: &Path,
        names: &Path,
        dry_run: bool,
        json: bool,
        out: &mut impl Write,
    ) -> Result<BatchReport> {
        let backend = backend(directory, dry_run)?;
        let planned = self.resolve(&backend, directory, names).await?;
        let ctx = Context::new(self.executor.clone());
        let report = BatchReport::collect(rename_batch(&backend, &ctx, planned)).await;
        self.persist_cache().await;

        if json {
            serde_json::to_writer_pretty(&mut *out, &report).or_raise(|| ErrorKind::Output)?;
            writeln!(out).or_raise(|| ErrorKind::Output)?;
            return Ok(report);
        }
        write_report(&report, dry_run, out).or_raise(|| ErrorKind::Output)?;
        Ok(report)
    }

    pub async fn lookup(&self, latitude: f64, longitude: f64, out: &mut impl Write) -> Result<(String, bool)> {
        let coordinate = Coordinate::new(latitude, longitude).or_raise(|| ErrorKind::Coordinate)?;
        let (label, cached) = self.locator.lookup_coordinate_label(coordinate).await;
        let shown = if label.is_empty() { "(no label)" } else { label.as_str() };
        let source = if cached { " (cached)" } else { "" };
        writeln!(out, "{coordinate}: {shown}{source}").or_raise(|| ErrorKind::Output)?;
        self.persist_cache().await;
        Ok((label, cached))
    }

    pub async fn cache_stats(&self, out: &mut impl Write) -> Result<()> {
        let stats = self.locator.cache_stats().await;
        write_stats(&stats, out).or_raise(|| ErrorKind::Output)
    }

    pub async fn cache_clear(&self, out: &mut impl Write) -> Result<()> {
        let removed = self.locator.cache_stats().await.total_entries;
        self.locator.clear_cache().await;
        self.locator.save_cache().await.or_raise(|| ErrorKind::Cache)?;
        writeln!(out, "Removed {removed} cached labels").or_raise(|| ErrorKind::Output)
    }

    async fn resolve(&self, backend: &BackendHandle, directory: &Path, names: &Path) -> Result<Vec<Planned>> {
        let entries = read_names(names)?;
        tracing::info!(files = entries.len(), names = %names.display(), "Read names file");
        let records = into_records(entries, directory, &self.locator, &self.videos).await;
        Ok(resolve_batch(backend, records).await)
    }

    /// A failed save only costs future lookups, so it doesn't fail the command.
    async fn persist_cache(&self) {
        if let Err(e) = self.locator.save_cache().await {
            tracing::warn!(error = ?e, "Could not save label cache");
        }
    }
}

fn backend(directory: &Path, read_only: bool) -> Result<BackendHandle> {
    let invalid = || ErrorKind::Directory(directory.to_path_buf());
    let root = std::path::absolute(directory).or_raise(invalid)?;
    let local: BackendHandle = Arc::new(LocalBackend::new("local", root).or_raise(invalid)?);
    if read_only {
        return Ok(Arc::new(ReadOnlyBackend::new(local)));
    }
    Ok(local)
}

fn write_stats(stats: &CacheStats, out: &mut impl Write) -> std::io::Result<()> {
    let file = match &stats.cache_file {
        Some(path) => path.display().to_string(),
        None => "(in memory)".to_string(),
    };
    let state = if stats.file_exists { "present" } else { "absent" };
    writeln!(out, "entries:   {} / {}", stats.total_entries, stats.max_entries)?;
    writeln!(out, "tolerance: {}", stats.tolerance)?;
    writeln!(out, "file:      {file} ({state})")
}

fn write_report(report: &BatchReport, dry_run: bool, out: &mut impl Write) -> std::io::Result<()> {
    for op in &report.operations {
        match (op.status, &op.message) {
            (Status::Success, _) => writeln!(out, "{} -> {}", op.original, op.final_name)?,
            (status, Some(message)) => writeln!(out, "{}: {status} ({message})", op.original)?,
            (status, None) => writeln!(out, "{}: {status}", op.original)?,
        }
    }
    let prefix = if dry_run { "(dry run) " } else { "" };
    writeln!(
        out,
        "{prefix}{} files: {} renamed, {} skipped, {} failed",
        report.total(),
        report.processed,
        report.skipped,
        report.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use renamr_cache::CacheOptions;
    use renamr_geocode::LabelLookup;
    use renamr_recovery::RetryPolicy;
    use std::path::PathBuf;
    use std::time::Duration;

    struct Fixed;

    #[async_trait]
    impl LabelLookup for Fixed {
        async fn lookup(&self, _: Coordinate) -> renamr_geocode::error::Result<String> {
            Ok("Prague".to_string())
        }
    }

    fn app(cache_file: PathBuf) -> App {
        let executor = Arc::new(Executor::new(RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }));
        let (cache, _) = ProximityCache::open(cache_file, CacheOptions::default());
        let videos = VideoLocator::new(ToolProbe::new("renamr-test-no-such-ffprobe"));
        App::new(Locator::new(cache, Arc::new(Fixed), executor.clone()), executor, videos)
    }

    fn fixture() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let photos = dir.path().join("photos");
        std::fs::create_dir(&photos).unwrap();
        for name in ["IMG_1.jpg", "IMG_2.jpg", "IMG_3.jpg", "Prague.jpg"] {
            std::fs::write(photos.join(name), name).unwrap();
        }
        let names = dir.path().join("names.json");
        std::fs::write(
            &names,
            r#"[
                {"original": "IMG_1.jpg", "desired": "{label}.jpg", "latitude": 50.08, "longitude": 14.43},
                {"original": "IMG_2.jpg", "desired": "{label}.jpg", "latitude": 50.08, "longitude": 14.43},
                {"original": "IMG_3.jpg", "desired": "No metadata"}
            ]"#,
        )
        .unwrap();
        (dir, photos, names)
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_plan_leaves_files_alone() {
        let (dir, photos, names) = fixture();
        let app = app(dir.path().join("cache.json"));
        let mut out = Vec::new();
        app.plan(&photos, &names, &mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out.lines().collect::<Vec<_>>(),
            ["IMG_1.jpg -> Prague_c1.jpg", "IMG_2.jpg -> Prague_001.jpg", "IMG_3.jpg -> No metadata"]
        );
        assert_eq!(listing(&photos), ["IMG_1.jpg", "IMG_2.jpg", "IMG_3.jpg", "Prague.jpg"]);
        assert!(dir.path().join("cache.json").exists());
    }

    #[tokio::test]
    async fn test_apply() {
        let (dir, photos, names) = fixture();
        let app = app(dir.path().join("cache.json"));
        let mut out = Vec::new();
        let report = app.apply(&photos, &names, false, false, &mut out).await.unwrap();

        assert_eq!((report.processed, report.skipped, report.failed), (3, 0, 0));
        assert_eq!(listing(&photos), ["Prague.jpg", "Prague_001.jpg", "Prague_c1.jpg", "_IMG_3.jpg"]);
        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with("3 files: 3 renamed, 0 skipped, 0 failed\n"), "{out}");
    }

    #[tokio::test]
    async fn test_apply_without_video_tool() {
        let (dir, photos, _) = fixture();
        std::fs::write(photos.join("clip.mov"), "clip").unwrap();
        let names = dir.path().join("videos.json");
        std::fs::write(&names, r#"[{"original": "clip.mov", "desired": "{label}.mov"}]"#).unwrap();
        let app = app(dir.path().join("cache.json"));
        let report = app.apply(&photos, &names, false, false, &mut Vec::new()).await.unwrap();

        // No location could be read, so the video is treated as having no metadata.
        assert_eq!((report.processed, report.failed), (1, 0));
        assert!(photos.join("_clip.mov").exists());
    }

    #[tokio::test]
    async fn test_apply_dry_run_json() {
        let (dir, photos, names) = fixture();
        let app = app(dir.path().join("cache.json"));
        let mut out = Vec::new();
        let report = app.apply(&photos, &names, true, true, &mut out).await.unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(listing(&photos), ["IMG_1.jpg", "IMG_2.jpg", "IMG_3.jpg", "Prague.jpg"]);
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["processed"], 3);
        assert_eq!(json["operations"][2]["final_name"], "_IMG_3.jpg");
    }

    #[tokio::test]
    async fn test_apply_missing_directory() {
        let (dir, _, names) = fixture();
        let app = app(dir.path().join("cache.json"));
        let err = app.apply(&dir.path().join("nope"), &names, false, false, &mut Vec::new()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Directory(_)));
    }

    #[tokio::test]
    async fn test_lookup_then_cache_commands() {
        let dir = tempfile::tempdir().unwrap();
        let cache_file = dir.path().join("cache.json");
        let app = app(cache_file.clone());

        let mut out = Vec::new();
        assert_eq!(app.lookup(50.08, 14.43, &mut out).await.unwrap(), ("Prague".to_string(), false));
        assert_eq!(app.lookup(50.0801, 14.4301, &mut out).await.unwrap(), ("Prague".to_string(), true));
        assert!(String::from_utf8(out).unwrap().lines().nth(1).unwrap().ends_with("Prague (cached)"));

        let mut out = Vec::new();
        app.cache_stats(&mut out).await.unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("entries:   1 / 1000\n"), "{out}");
        assert!(out.contains("(present)"), "{out}");

        let mut out = Vec::new();
        app.cache_clear(&mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Removed 1 cached labels\n");
        let (reopened, _) = ProximityCache::open(cache_file, CacheOptions::default());
        assert!(reopened.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_rejects_invalid_coordinate() {
        let dir = tempfile::tempdir().unwrap();
        let err = app(dir.path().join("cache.json")).lookup(120.0, 0.0, &mut Vec::new()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Coordinate));
    }
}
