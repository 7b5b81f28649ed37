//! Fallback strategies for when an operation has already failed.
//!
//! None of these retry anything; they decide what the caller should carry on
//! with and record how that decision was made.

use crate::error::ErrorKind;
use crate::{Executor, Recovery, RecoveryMethod};
use std::fmt::Display;
use std::path::Path;

/// Longest raw response body echoed into the log.
const MAX_LOGGED_RESPONSE: usize = 500;

impl Executor {
    /// A network lookup failed. Answer with `cached` when there is a
    /// non-empty cached label, otherwise with an empty label.
    ///
    /// Always succeeds: "no label" is a valid outcome, a failed lookup is not
    /// allowed to fail the file it was for.
    pub fn handle_network_error(&self, error: &dyn Display, context: &str, cached: Option<String>) -> Recovery<String> {
        let _guard = self.span().enter();
        tracing::warn!(context, error = %error, "Network error");
        let outcome = match cached.filter(|label| !label.is_empty()) {
            Some(label) => {
                tracing::info!(context, label = %label, "Using cached label");
                Recovery::succeeded(label, 0, RecoveryMethod::CachedFallback)
            },
            None => {
                tracing::info!(context, "No cached label; continuing without one");
                Recovery::succeeded(String::new(), 0, RecoveryMethod::GracefulDegradation)
            },
        };
        self.record(true);
        outcome
    }

    /// The operating system refused access to `path`. The caller skips that
    /// one file and carries on with the batch.
    pub fn handle_permission_error<T: Default>(&self, path: &Path, operation: &str) -> Recovery<T> {
        let _guard = self.span().enter();
        tracing::error!(path = %path.display(), operation, "Permission denied; skipping file");
        self.record(false);
        let error = exn::Exn::from(ErrorKind::PermissionDenied {
            path: path.to_path_buf(),
            operation: operation.to_string(),
        });
        Recovery::failed(Some(error), 0, RecoveryMethod::LogAndSkip)
    }

    /// `path` could not be read as the expected format. The caller drops
    /// whatever it was reading and carries on.
    pub fn handle_corrupted_file<T: Default>(&self, path: &Path, error: &dyn Display) -> Recovery<T> {
        let _guard = self.span().enter();
        tracing::error!(path = %path.display(), error = %error, "Corrupted file; continuing");
        self.record(false);
        Recovery::failed(
            Some(exn::Exn::from(ErrorKind::CorruptedFile(path.to_path_buf()))),
            0,
            RecoveryMethod::LogAndContinue,
        )
    }

    /// An upstream response didn't have the expected shape. Logs the raw
    /// body (and whatever JSON structure it does have) for diagnosis, then
    /// continues with an empty label.
    pub fn handle_malformed_response(&self, error: &dyn Display, raw: &str) -> Recovery<String> {
        let _guard = self.span().enter();
        tracing::warn!(error = %error, "Malformed response; continuing without label");
        let excerpt: String = raw.chars().take(MAX_LOGGED_RESPONSE).collect();
        tracing::debug!(response = %excerpt, "Raw response");
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value) => tracing::debug!(shape = json_shape(&value), "Response parsed as JSON"),
            Err(e) => tracing::debug!(error = %e, "Response is not valid JSON"),
        }
        self.record(true);
        Recovery::succeeded(String::new(), 0, RecoveryMethod::ContinueWithoutLabel)
    }

    /// Logs `error` with its context and reports a failure the caller can
    /// ignore.
    pub fn log_and_continue<T: Default>(&self, error: &dyn Display, context: &str, path: Option<&Path>) -> Recovery<T> {
        let _guard = self.span().enter();
        match path {
            Some(path) => tracing::error!(context, path = %path.display(), error = %error, "Error; continuing"),
            None => tracing::error!(context, error = %error, "Error; continuing"),
        }
        self.record(false);
        let message = match path {
            Some(path) => format!("{context} ({}): {error}", path.display()),
            None => format!("{context}: {error}"),
        };
        Recovery::failed(Some(exn::Exn::from(ErrorKind::Logged(message))), 0, RecoveryMethod::LogAndContinue)
    }
}

fn json_shape(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
