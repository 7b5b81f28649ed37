use crate::error::ErrorKind;
use crate::{Recovery, RecoveryMethod};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::OnceCell;

/// Default time allowed for the version check subprocess.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// One-time availability check for an optional external tool (e.g. `ffprobe`).
///
/// The first call to [`is_available`](Self::is_available) resolves the tool
/// on `PATH` and runs `<tool> -version`; every later call reuses that answer.
pub struct ToolProbe {
    tool: String,
    args: Vec<String>,
    timeout: Duration,
    available: OnceCell<bool>,
}

impl ToolProbe {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            args: vec!["-version".to_string()],
            timeout: DEFAULT_PROBE_TIMEOUT,
            available: OnceCell::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the arguments used for the check (default `-version`).
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Time allowed for the check, and a sensible bound for any other call
    /// made to the tool.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn is_available(&self) -> bool {
        *self.available.get_or_init(|| self.check()).await
    }

    /// Success when the tool is available, otherwise a failure tagged
    /// [`ReducedFeature`](RecoveryMethod::ReducedFeature): the caller should
    /// carry on processing `path` without it.
    pub async fn require(&self, path: &Path) -> Recovery<bool> {
        if self.is_available().await {
            return Recovery::succeeded(true, 0, RecoveryMethod::Direct);
        }
        tracing::warn!(tool = %self.tool, path = %path.display(), "Tool unavailable; using reduced feature set");
        Recovery::failed(
            Some(exn::Exn::from(ErrorKind::ToolUnavailable(self.tool.clone()))),
            0,
            RecoveryMethod::ReducedFeature,
        )
    }

    async fn check(&self) -> bool {
        let Ok(path) = which::which(&self.tool) else {
            tracing::info!(tool = %self.tool, "Tool not found in PATH");
            return false;
        };
        tracing::trace!(tool = %self.tool, path = %path.display(), "Discovered tool; checking it runs");
        let output = Command::new(&path)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();
        match tokio::time::timeout(self.timeout, output).await {
            Ok(Ok(status)) if status.success() => true,
            Ok(Ok(status)) => {
                tracing::info!(tool = %self.tool, %status, "Tool version check failed");
                false
            },
            Ok(Err(e)) => {
                tracing::info!(tool = %self.tool, error = %e, "Could not run tool");
                false
            },
            Err(_) => {
                tracing::info!(tool = %self.tool, timeout = ?self.timeout, "Tool version check timed out");
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_tool_is_unavailable() {
        let probe = ToolProbe::new("definitely-not-an-installed-tool-7c1e");
        assert!(!probe.is_available().await);
        let outcome = probe.require(Path::new("clip.mp4")).await;
        assert!(!outcome.success);
        assert!(!outcome.result);
        assert_eq!(outcome.method, RecoveryMethod::ReducedFeature);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runnable_tool_is_available_and_cached() {
        // `true` ignores its arguments and exits 0.
        let probe = ToolProbe::new("true");
        assert!(probe.is_available().await);
        assert_eq!(probe.available.get(), Some(&true));
        assert!(probe.require(Path::new("clip.mp4")).await.success);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_tool_is_unavailable() {
        let probe = ToolProbe::new("false");
        assert!(!probe.is_available().await);
    }
}
