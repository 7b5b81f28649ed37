use derive_more::Display;

/// The strategy that produced a [`Recovery`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryMethod {
    /// The operation ran without any recovery involved.
    #[display("direct")]
    Direct,
    /// The operation was attempted (and possibly retried) with exponential backoff.
    #[display("retry_with_backoff")]
    RetryWithBackoff,
    /// A network failure was answered from previously cached data.
    #[display("cached_fallback")]
    CachedFallback,
    /// A network failure was answered with an empty result.
    #[display("graceful_degradation")]
    GracefulDegradation,
    /// The affected file should be skipped; the batch continues.
    #[display("log_and_skip")]
    LogAndSkip,
    /// The failure was logged; the batch continues.
    #[display("log_and_continue")]
    LogAndContinue,
    /// An optional capability is missing; continue on the reduced-feature path.
    #[display("reduced_feature")]
    ReducedFeature,
    /// An upstream response had an unexpected shape; continue with an empty label.
    #[display("continue_without_label")]
    ContinueWithoutLabel,
}

/// Outcome of a resilience operation. Never an error: failure is data.
///
/// `result` always holds a usable value. On failure it is `T::default()`,
/// so callers can use it unconditionally.
#[derive(Debug)]
pub struct Recovery<T, E = crate::error::Error> {
    pub success: bool,
    pub result: T,
    pub error: Option<E>,
    pub attempts: u32,
    pub method: RecoveryMethod,
}

impl<T, E> Recovery<T, E> {
    pub fn succeeded(result: T, attempts: u32, method: RecoveryMethod) -> Self {
        Self {
            success: true,
            result,
            error: None,
            attempts,
            method,
        }
    }

    pub fn failed(error: Option<E>, attempts: u32, method: RecoveryMethod) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            result: T::default(),
            error,
            attempts,
            method,
        }
    }

    /// Discards the bookkeeping and returns the (possibly default) value.
    pub fn into_result(self) -> T {
        self.result
    }

    /// Replaces the error with another type, e.g. to hand a typed failure
    /// to a fallback that reports its own errors.
    pub fn map_err<F>(self, f: impl FnOnce(E) -> F) -> Recovery<T, F> {
        Recovery {
            success: self.success,
            result: self.result,
            error: self.error.map(f),
            attempts: self.attempts,
            method: self.method,
        }
    }
}
