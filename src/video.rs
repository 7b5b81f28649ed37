//! Coordinates embedded in video containers.
//!
//! Phones write the recording location into a container tag as an ISO 6709
//! string (`+50.0800+014.4300+214.199/`). `ffprobe` prints the container tags;
//! without it, videos simply have no location.

use regex::Regex;
use renamr_cache::Coordinate;
use renamr_library::resolve::split_extension;
use renamr_recovery::ToolProbe;
use std::path::Path;
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::Command;

pub const VIDEO_EXTENSIONS: &[&str] = &["3gp", "avi", "m4v", "mkv", "mov", "mp4", "mts", "wmv"];

static ISO6709: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([+-]\d+\.\d+)([+-]\d+\.\d+)").unwrap());

pub fn is_video(name: &str) -> bool {
    let (_, extension) = split_extension(name);
    extension
        .strip_prefix('.')
        .is_some_and(|extension| VIDEO_EXTENSIONS.iter().any(|video| video.eq_ignore_ascii_case(extension)))
}

/// The first ISO 6709 latitude/longitude pair in `tags`, if it is a valid
/// coordinate.
pub fn parse_location(tags: &str) -> Option<Coordinate> {
    let captures = ISO6709.captures(tags)?;
    let latitude = captures[1].parse().ok()?;
    let longitude = captures[2].parse().ok()?;
    Coordinate::new(latitude, longitude).ok()
}

/// Reads video locations through `ffprobe`, if it is installed.
pub struct VideoLocator {
    probe: ToolProbe,
}

impl VideoLocator {
    pub fn new(probe: ToolProbe) -> Self {
        Self { probe }
    }

    /// Location recorded in the video at `path`.
    ///
    /// `None` when the tool is unavailable (checked once, then every video
    /// takes the reduced path of having no location), when the tool fails or
    /// when the container has no location tag.
    pub async fn coordinate(&self, path: &Path) -> Option<Coordinate> {
        if !self.probe.require(path).await.success {
            return None;
        }
        let output = Command::new(self.probe.tool())
            .args(["-v", "quiet", "-show_entries", "format_tags", "-of", "csv=p=0"])
            .arg(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();
        let output = match tokio::time::timeout(self.probe.timeout(), output).await {
            Ok(Ok(output)) if output.status.success() => output,
            Ok(Ok(output)) => {
                tracing::debug!(path = %path.display(), status = %output.status, "Could not read video tags");
                return None;
            },
            Ok(Err(e)) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not run video probe");
                return None;
            },
            Err(_) => {
                tracing::warn!(path = %path.display(), timeout = ?self.probe.timeout(), "Video probe timed out");
                return None;
            },
        };
        let coordinate = parse_location(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(path = %path.display(), ?coordinate, "Read video location");
        coordinate
    }
}
