//! Layered configuration for renamr.
//!
//! Values are merged from, lowest precedence first:
//!
//! 1. compiled-in defaults ([`Config::default`]),
//! 2. a configuration file (`.toml`, `.yaml`/`.yml` or `.json`),
//! 3. environment variables prefixed `RENAMR_`, with `__` separating nested
//!    keys (`RENAMR_CACHE__MAX_ENTRIES=500`).
//!
//! The result is validated before it is handed out.

pub mod error;
mod load;

pub use crate::load::{ENV_PREFIX, default_config_file};
use crate::error::{ErrorKind, Result};
use renamr_cache::{CacheOptions, DEFAULT_MAX_ENTRIES, DEFAULT_TOLERANCE};
use renamr_geocode::{DEFAULT_ENDPOINT, NominatimOptions};
use renamr_recovery::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const APPLICATION: &str = "renamr";
const CACHE_FILE: &str = "city_cache.json";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub lookup: LookupConfig,
    pub probe: ProbeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Location of the label cache file.
    pub path: PathBuf,
    pub max_entries: usize,
    /// Matching tolerance in degrees, per axis.
    pub tolerance: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let path = directories::ProjectDirs::from("", "", APPLICATION)
            .map(|dirs| dirs.cache_dir().join(CACHE_FILE))
            .unwrap_or_else(|| PathBuf::from(CACHE_FILE));
        Self {
            path,
            max_entries: DEFAULT_MAX_ENTRIES,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Backoff time unit in milliseconds; retries wait 1, 2, 4, … units.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: u64::try_from(policy.base_delay.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub language: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        let options = NominatimOptions::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: options.timeout.as_secs(),
            user_agent: options.user_agent,
            language: options.language,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Executable that reads video container tags; looked up on `PATH`
    /// unless given as a path.
    pub tool: String,
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            tool: "ffprobe".to_string(),
            timeout_secs: 5,
        }
    }
}

impl Config {
    /// Rejects values no component can work with.
    ///
    /// # Errors
    /// [`ErrorKind::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("cache.max_entries", self.cache.max_entries >= 1),
            ("cache.tolerance", self.cache.tolerance.is_finite() && self.cache.tolerance >= 0.0),
            ("cache.path", !self.cache.path.as_os_str().is_empty()),
            ("retry.max_attempts", self.retry.max_attempts >= 1),
            (
                "lookup.endpoint",
                self.lookup.endpoint.starts_with("http://") || self.lookup.endpoint.starts_with("https://"),
            ),
            ("lookup.timeout_secs", self.lookup.timeout_secs >= 1),
            ("lookup.user_agent", !self.lookup.user_agent.trim().is_empty()),
            ("probe.tool", !self.probe.tool.trim().is_empty()),
            ("probe.timeout_secs", self.probe.timeout_secs >= 1),
        ];
        match checks.into_iter().find(|(_, valid)| !valid) {
            Some((field, _)) => exn::bail!(ErrorKind::Invalid(field.to_string())),
            None => Ok(()),
        }
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            path: Some(self.cache.path.clone()),
            max_entries: self.cache.max_entries,
            tolerance: self.cache.tolerance,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
        }
    }

    pub fn nominatim_options(&self) -> NominatimOptions {
        NominatimOptions {
            endpoint: self.lookup.endpoint.clone(),
            user_agent: self.lookup.user_agent.clone(),
            language: self.lookup.language.clone(),
            timeout: Duration::from_secs(self.lookup.timeout_secs),
            ..NominatimOptions::default()
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe.timeout_secs)
    }
}
