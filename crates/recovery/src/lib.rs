//! Bounded retries and graceful degradation.
//!
//! Every operation in this crate returns a [`Recovery`] value rather than an
//! error: the outcome, the attempts it took, and the [`RecoveryMethod`] that
//! produced it. Callers treat every outcome uniformly; on failure the
//! [`result`](Recovery::result) is still a safe default they can use.
//!
//! ```
//! use renamr_recovery::{Executor, RecoveryMethod, RetryPolicy};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let executor = Executor::new(RetryPolicy { max_attempts: 3, base_delay: Duration::ZERO });
//! let outcome = executor
//!     .retry_with_backoff("answer", || async { Ok::<_, exn::Exn<std::fmt::Error>>(42) })
//!     .await;
//! assert!(outcome.success);
//! assert_eq!(outcome.result, 42);
//! assert_eq!(outcome.method, RecoveryMethod::RetryWithBackoff);
//! # }
//! ```

pub mod error;
mod fallback;
mod outcome;
mod probe;
mod retry;

pub use crate::outcome::{Recovery, RecoveryMethod};
pub use crate::probe::ToolProbe;
pub use crate::retry::{Executor, RecoveryStats, RetryPolicy};
