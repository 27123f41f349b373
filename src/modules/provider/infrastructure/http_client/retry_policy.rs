//! Retry policies for the catalog sources
//!
//! One policy object decides, for every failed call, whether the client tries
//! again and how long it waits first. Rate limiting is never retried inline:
//! the client enters a cooldown and reports the failure instead.

use crate::modules::provider::domain::SourceError;
use std::time::Duration;

/// Configuration for HTTP retry behavior
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Maximum delay to wait (prevents excessive waits)
    pub max_delay: Duration,
    /// Whether to use exponential backoff
    pub exponential_backoff: bool,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    pub retry_on_timeout: bool,
    /// Refused, reset or dropped connections.
    pub retry_on_connection_error: bool,
    pub retry_on_server_error: bool,
}

impl RetryPolicy {
    /// Shikimori: every transient fault abandons the candidate at once and is
    /// counted by the batch; a later campaign pass picks the id up again.
    /// The backoff values only apply when a flag is switched on.
    pub fn shikimori() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            exponential_backoff: true,
            backoff_multiplier: 2.0,
            retry_on_timeout: false,
            retry_on_connection_error: false,
            retry_on_server_error: false,
        }
    }

    /// AniList (90 req/min limit)
    pub fn anilist() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(700),
            max_delay: Duration::from_secs(60),
            exponential_backoff: true,
            backoff_multiplier: 1.5,
            retry_on_timeout: true,
            retry_on_connection_error: true,
            retry_on_server_error: true,
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            exponential_backoff: false,
            backoff_multiplier: 1.0,
            retry_on_timeout: false,
            retry_on_connection_error: false,
            retry_on_server_error: false,
        }
    }

    /// Whether a failure on `attempt` (0-based) should be retried.
    pub fn should_retry(&self, error: &SourceError, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }

        match error {
            SourceError::RateLimited { .. } | SourceError::Decode(_) => false,
            SourceError::Timeout => self.retry_on_timeout,
            SourceError::Network(_) => self.retry_on_connection_error,
            SourceError::Http { .. } => self.retry_on_server_error && error.is_transient(),
        }
    }

    /// Calculate delay for next retry attempt
    pub fn calculate_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        // If server provided Retry-After header, respect it
        if let Some(server_delay) = retry_after {
            return server_delay.min(self.max_delay);
        }

        let delay = if self.exponential_backoff {
            let multiplier = self.backoff_multiplier.powi(attempt as i32);
            Duration::from_millis((self.base_delay.as_millis() as f64 * multiplier) as u64)
        } else {
            self.base_delay
        };

        delay.min(self.max_delay)
    }
}

/// Information extracted from HTTP 429 responses
#[derive(Debug, Clone, Default)]
pub struct RateLimitInfo {
    /// How long to wait before next request (from Retry-After header)
    pub retry_after: Option<Duration>,
    /// When the rate limit resets (from X-RateLimit-Reset header)
    pub reset_time: Option<Duration>,
    /// Number of requests remaining (from X-RateLimit-Remaining header)
    pub remaining: Option<u32>,
    /// Total rate limit (from X-RateLimit-Limit header)
    pub limit: Option<u32>,
}

impl RateLimitInfo {
    /// Parse rate limit information from HTTP response headers
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        let retry_after = headers
            .get("retry-after")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let reset_time = headers
            .get("x-ratelimit-reset")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(|timestamp| {
                let now = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs();
                Duration::from_secs(timestamp.saturating_sub(now))
            });

        let remaining = headers
            .get("x-ratelimit-remaining")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<u32>().ok());

        let limit = headers
            .get("x-ratelimit-limit")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<u32>().ok());

        Self {
            retry_after,
            reset_time,
            remaining,
            limit,
        }
    }

    /// Get the best delay recommendation from available information
    pub fn recommended_delay(&self) -> Option<Duration> {
        self.retry_after.or(self.reset_time)
    }
}
