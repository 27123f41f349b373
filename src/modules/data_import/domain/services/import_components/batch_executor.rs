use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::modules::anime::{AnimeRepository, RecordNormalizer};
use crate::modules::provider::{CatalogSource, SourceError};
use crate::shared::config::ImportProfile;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::TimedOperation;
use crate::{log_debug, log_warn};

use super::types::{ImportStats, TaskOutcome};

pub const DEFAULT_BATCH_CEILING: usize = 100;
pub const ERROR_MILESTONE: u64 = 100;

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub workers: usize,
    /// Most candidates dispatched from one batch.
    pub max_batch_size: usize,
    pub request_delay: Duration,
    pub rate_limit_cooldown: Duration,
    pub error_milestone: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            workers: 10,
            max_batch_size: DEFAULT_BATCH_CEILING,
            request_delay: Duration::from_millis(100),
            rate_limit_cooldown: Duration::from_secs(5),
            error_milestone: ERROR_MILESTONE,
        }
    }
}

impl BatchSettings {
    pub fn from_profile(profile: &ImportProfile) -> Self {
        Self {
            workers: profile.workers.max(1),
            max_batch_size: profile.batch_size.max(1),
            request_delay: profile.request_delay,
            rate_limit_cooldown: profile.rate_limit_cooldown,
            error_milestone: ERROR_MILESTONE,
        }
    }
}

/// Fetch, normalize and persist one batch of candidate ids with a bounded
/// worker pool.
#[derive(Clone)]
pub struct BatchImporter {
    source: Arc<dyn CatalogSource>,
    normalizer: RecordNormalizer,
    repository: Arc<dyn AnimeRepository>,
    settings: BatchSettings,
    stats: Arc<ImportStats>,
    cancel: CancellationToken,
}

impl BatchImporter {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        normalizer: RecordNormalizer,
        repository: Arc<dyn AnimeRepository>,
        settings: BatchSettings,
    ) -> Self {
        Self {
            source,
            normalizer,
            repository,
            settings,
            stats: Arc::new(ImportStats::new()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_stats(mut self, stats: Arc<ImportStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn stats(&self) -> Arc<ImportStats> {
        self.stats.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Imports the ids of `ids` not yet persisted and returns how many records
    /// this batch created. Only a failing existing-id lookup is an error;
    /// per-candidate failures end up in the shared stats.
    pub async fn run_batch(&self, ids: &[i64]) -> AppResult<usize> {
        if self.cancel.is_cancelled() {
            return Ok(0);
        }

        let mut seen = HashSet::new();
        let candidates: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| *id > 0 && seen.insert(*id))
            .collect();
        if candidates.is_empty() {
            return Ok(0);
        }

        let existing = self
            .repository
            .filter_existing(&candidates)
            .await
            .map_err(|e| match e {
                AppError::SetupFault(_) => e,
                other => AppError::SetupFault(format!("Existing-id lookup failed: {}", other)),
            })?;

        let pending: Vec<i64> = candidates
            .into_iter()
            .filter(|id| !existing.contains(id))
            .take(self.settings.max_batch_size)
            .collect();

        log_debug!(
            "Batch of {} ids: {} already stored, {} to fetch",
            ids.len(),
            existing.len(),
            pending.len()
        );
        if pending.is_empty() {
            return Ok(0);
        }

        let timer = TimedOperation::new("run_batch");
        let workers = self.settings.workers.max(1);

        let outcomes: Vec<TaskOutcome> = stream::iter(pending)
            .take_until(self.cancel.cancelled())
            .map(|id| {
                let importer = self.clone();
                async move {
                    match tokio::spawn(async move { importer.import_candidate(id).await }).await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            log_warn!("Task for id {} aborted: {}", id, e);
                            self.record_failure();
                            TaskOutcome::Failed(e.to_string())
                        }
                    }
                }
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        let imported = outcomes.iter().filter(|o| o.is_imported()).count();
        timer.finish_with_info(&format!(
            "{} tasks, {} imported",
            outcomes.len(),
            imported
        ));
        Ok(imported)
    }

    /// One fetch-normalize-persist task. Never fails; the outcome is also
    /// recorded in the shared stats.
    pub async fn import_candidate(&self, id: i64) -> TaskOutcome {
        if self.cancel.is_cancelled() {
            return TaskOutcome::Cancelled;
        }

        self.stats.record_attempt();
        let outcome = self.fetch_and_persist(id).await;

        match &outcome {
            TaskOutcome::Imported => self.stats.record_imported(),
            TaskOutcome::AlreadyPresent => self.stats.record_already_present(),
            TaskOutcome::NotFound => self.stats.record_not_found(),
            TaskOutcome::RateLimited => self.stats.record_rate_limited(),
            TaskOutcome::Failed(reason) => {
                log_debug!("Candidate {} failed: {}", id, reason);
                self.record_failure();
            }
            TaskOutcome::Cancelled => {}
        }

        outcome
    }

    async fn fetch_and_persist(&self, id: i64) -> TaskOutcome {
        let mut raw = match self.source.fetch_by_id(id).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return TaskOutcome::NotFound,
            Err(SourceError::RateLimited { retry_after }) => {
                // Fixed cooldown; a server hint never holds a worker longer
                let cooldown = self.settings.rate_limit_cooldown;
                log_warn!(
                    "Rate limited on id {} (server asked {:?}), cooling down for {}ms",
                    id,
                    retry_after,
                    cooldown.as_millis()
                );
                self.pause(cooldown).await;
                return TaskOutcome::RateLimited;
            }
            Err(e) => return TaskOutcome::Failed(e.to_string()),
        };
        raw.id.get_or_insert(id);

        let record = self.normalizer.normalize(&raw).await;
        let persisted = match self.repository.persist(&record).await {
            Ok(outcome) => outcome,
            Err(e) => return TaskOutcome::Failed(e.to_string()),
        };

        self.pause(self.settings.request_delay).await;

        if persisted.created {
            TaskOutcome::Imported
        } else {
            TaskOutcome::AlreadyPresent
        }
    }

    fn record_failure(&self) {
        let errors = self.stats.record_error();
        if self.settings.error_milestone > 0 && errors % self.settings.error_milestone == 0 {
            log_warn!("Import has reached {} errors", errors);
        }
    }

    /// Sleeps unless cancelled first.
    async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.cancel.cancelled() => {
                log_debug!("Pause cut short by cancellation");
            }
        }
    }
}
