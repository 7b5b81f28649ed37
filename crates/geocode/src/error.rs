//! Geocoding Error Types

use derive_more::{Display, Error};

/// A geocoding error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for geocoding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The request did not complete within the per-call timeout.
    #[display("lookup timed out")]
    Timeout,
    /// Connection, TLS or transport failure.
    #[display("network error")]
    Network,
    /// The service answered with a non-success HTTP status.
    #[display("unexpected HTTP status {_0}")]
    Status(#[error(not(source))] u16),
    /// The body was not the expected JSON object. Holds the raw body.
    #[display("malformed response")]
    MalformedResponse(#[error(not(source))] String),
    /// The HTTP client could not be built from the given options.
    #[display("invalid lookup configuration")]
    Config,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Network => true,
            Self::Status(code) => *code == 429 || *code >= 500,
            Self::MalformedResponse(_) | Self::Config => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Timeout, true)]
    #[case(ErrorKind::Network, true)]
    #[case(ErrorKind::Status(503), true)]
    #[case(ErrorKind::Status(429), true)]
    #[case(ErrorKind::Status(404), false)]
    #[case(ErrorKind::MalformedResponse("<html>".to_string()), false)]
    fn test_is_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }
}
