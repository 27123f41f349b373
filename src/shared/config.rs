//! Runtime configuration for the ingestion pipeline.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file through `dotenvy`). Every setting has a default so the binary runs
//! without any configuration except `DATABASE_URL`.

use crate::shared::errors::{AppError, AppResult};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SHIKIMORI_BASE_URL: &str = "https://shikimori.one";
pub const DEFAULT_ANILIST_BASE_URL: &str = "https://graphql.anilist.co";
pub const DEFAULT_USER_AGENT: &str = "anime-ingest/0.1 (catalog importer)";

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub database_url: Option<String>,
    pub shikimori_base_url: String,
    pub anilist_base_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub workers: usize,
    pub batch_size: usize,
    pub request_delay: Duration,
    pub rate_limit_cooldown: Duration,
    pub requests_per_second: f64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            shikimori_base_url: DEFAULT_SHIKIMORI_BASE_URL.to_string(),
            anilist_base_url: DEFAULT_ANILIST_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(10),
            workers: 10,
            batch_size: 100,
            request_delay: Duration::from_millis(100),
            rate_limit_cooldown: Duration::from_secs(5),
            requests_per_second: 5.0,
        }
    }
}

impl IngestConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            database_url: env::var("DATABASE_URL").ok(),
            shikimori_base_url: env::var("SHIKIMORI_BASE_URL")
                .unwrap_or(defaults.shikimori_base_url)
                .trim_end_matches('/')
                .to_string(),
            anilist_base_url: env::var("ANILIST_BASE_URL").unwrap_or(defaults.anilist_base_url),
            user_agent: env::var("INGEST_USER_AGENT").unwrap_or(defaults.user_agent),
            request_timeout: Duration::from_secs(read_var(
                "INGEST_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            workers: read_var("INGEST_WORKERS", defaults.workers)?,
            batch_size: read_var("INGEST_BATCH_SIZE", defaults.batch_size)?,
            request_delay: Duration::from_millis(read_var(
                "INGEST_REQUEST_DELAY_MS",
                defaults.request_delay.as_millis() as u64,
            )?),
            rate_limit_cooldown: Duration::from_secs(read_var(
                "INGEST_RATE_LIMIT_COOLDOWN_SECS",
                defaults.rate_limit_cooldown.as_secs(),
            )?),
            requests_per_second: read_var(
                "INGEST_REQUESTS_PER_SECOND",
                defaults.requests_per_second,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.workers == 0 {
            return Err(AppError::ConfigError(
                "INGEST_WORKERS must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(AppError::ConfigError(
                "INGEST_BATCH_SIZE must be at least 1".to_string(),
            ));
        }
        if self.requests_per_second < 0.0 {
            return Err(AppError::ConfigError(
                "INGEST_REQUESTS_PER_SECOND cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn require_database_url(&self) -> AppResult<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            AppError::ConfigError("DATABASE_URL environment variable not found".to_string())
        })
    }
}

fn read_var<T>(name: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::ConfigError(format!("{} is invalid: {}", name, e))),
        _ => Ok(default),
    }
}

/// Throughput profile applied to a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Standard,
    /// Ten times the workers, no self-throttling, no client-side limiter.
    /// Upstream may ban the client; callers must acknowledge that explicitly.
    Ultra,
}

#[derive(Debug, Clone)]
pub struct ImportProfile {
    pub kind: ProfileKind,
    pub workers: usize,
    pub batch_size: usize,
    pub request_delay: Duration,
    pub rate_limit_cooldown: Duration,
    /// `None` disables the client-side token bucket.
    pub requests_per_second: Option<f64>,
}

impl ImportProfile {
    pub fn standard() -> Self {
        Self::from_config(&IngestConfig::default(), ProfileKind::Standard)
    }

    pub fn ultra() -> Self {
        Self::from_config(&IngestConfig::default(), ProfileKind::Ultra)
    }

    pub fn from_config(config: &IngestConfig, kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Standard => Self {
                kind,
                workers: config.workers,
                batch_size: config.batch_size,
                request_delay: config.request_delay,
                rate_limit_cooldown: config.rate_limit_cooldown,
                requests_per_second: Some(config.requests_per_second),
            },
            ProfileKind::Ultra => Self {
                kind,
                workers: config.workers * 10,
                batch_size: config.batch_size,
                request_delay: Duration::ZERO,
                rate_limit_cooldown: config.rate_limit_cooldown,
                requests_per_second: None,
            },
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn is_ultra(&self) -> bool {
        self.kind == ProfileKind::Ultra
    }
}
