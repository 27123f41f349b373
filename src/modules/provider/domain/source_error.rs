use std::time::Duration;
use thiserror::Error;

/// Failure of a single call against an external catalog source.
///
/// A missing record is not an error: sources report it as `Ok(None)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("rate limited by upstream (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected HTTP status {status}")]
    Http { status: u16 },

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl SourceError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SourceError::RateLimited { .. })
    }

    /// Server-side or transport faults that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Timeout | SourceError::Network(_) => true,
            SourceError::Http { status } => matches!(status, 408 | 425 | 500..=599),
            SourceError::RateLimited { .. } | SourceError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_decode() {
            SourceError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                429 => SourceError::RateLimited { retry_after: None },
                code => SourceError::Http { status: code },
            }
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Decode(err.to_string())
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(SourceError::Timeout.is_transient());
        assert!(SourceError::Http { status: 503 }.is_transient());
        assert!(!SourceError::Http { status: 400 }.is_transient());
        assert!(!SourceError::RateLimited { retry_after: None }.is_transient());
        assert!(!SourceError::Decode("bad".into()).is_transient());
    }
}
