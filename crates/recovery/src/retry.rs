use crate::{Recovery, RecoveryMethod};
use std::error::Error as StdError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{Instrument, Span};

/// Default number of attempts per operation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default backoff unit; the n-th retry waits `2^(n-1)` of these.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// How many times to attempt an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// The backoff time unit.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt with zero-based `attempt` index:
    /// `base_delay × 2^attempt` (saturating).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Counts of recovery operations performed by one [`Executor`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
}

/// Runs unreliable operations under a [`RetryPolicy`] and provides the
/// fallback chain for when they keep failing.
///
/// All events are emitted inside the span given to [`with_span`](Self::with_span)
/// (none by default), so a caller controls where the executor's logging ends
/// up without any global logger configuration.
#[derive(Debug)]
pub struct Executor {
    policy: RetryPolicy,
    span: Span,
    counters: Counters,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl Executor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            span: Span::none(),
            counters: Counters::default(),
        }
    }

    /// Emit all events inside `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub(crate) fn span(&self) -> &Span {
        &self.span
    }

    /// Attempts `operation` up to `max_attempts` times.
    ///
    /// Returns immediately on the first success, with the number of attempts
    /// used. After a failed attempt it sleeps `base_delay × 2^index` before
    /// the next one, except after the final attempt. When every attempt fails
    /// the result is a failure carrying the last error and
    /// `attempts == max_attempts`. Never panics or returns early with an error.
    ///
    /// There is no overall deadline; wrap the returned future in
    /// [`tokio::time::timeout`] for one.
    pub async fn retry_with_backoff<T, K, F, Fut>(&self, operation: &str, mut f: F) -> Recovery<T, exn::Exn<K>>
    where
        T: Default,
        K: StdError + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, exn::Exn<K>>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let outcome = async {
            let mut last_error = None;
            for attempt in 0..max_attempts {
                match f().await {
                    Ok(value) => {
                        if attempt > 0 {
                            tracing::info!(operation, attempts = attempt + 1, "Operation succeeded after retry");
                        }
                        return Recovery::succeeded(value, attempt + 1, RecoveryMethod::RetryWithBackoff);
                    },
                    Err(e) => {
                        tracing::warn!(operation, attempt = attempt + 1, max_attempts, error = %*e, "Attempt failed");
                        last_error = Some(e);
                        if attempt + 1 < max_attempts {
                            let delay = self.policy.delay_for(attempt);
                            tracing::debug!(operation, delay = ?delay, "Backing off before retry");
                            tokio::time::sleep(delay).await;
                        }
                    },
                }
            }
            tracing::error!(operation, max_attempts, "All attempts failed");
            Recovery::failed(last_error, max_attempts, RecoveryMethod::RetryWithBackoff)
        }
        .instrument(self.span.clone())
        .await;
        self.record(outcome.success);
        outcome
    }

    /// Runs `operation` once. A failure is logged and passed through
    /// [`log_and_continue`](Self::log_and_continue).
    pub async fn safe_execute<T, K, F, Fut>(&self, operation: &str, f: F) -> Recovery<T>
    where
        T: Default,
        K: StdError + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, exn::Exn<K>>>,
    {
        match f().instrument(self.span.clone()).await {
            Ok(value) => {
                self.record(true);
                Recovery::succeeded(value, 1, RecoveryMethod::Direct)
            },
            Err(e) => {
                let mut outcome = self.log_and_continue(&*e, operation, None);
                outcome.attempts = 1;
                outcome
            },
        }
    }

    /// Snapshot of how many recovery operations this executor has performed.
    pub fn stats(&self) -> RecoveryStats {
        RecoveryStats {
            total: self.counters.total.load(Ordering::Relaxed),
            successful: self.counters.successful.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record(&self, success: bool) {
        self.counters.total.fetch_add(1, Ordering::Relaxed);
        let counter = if success { &self.counters.successful } else { &self.counters.failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
