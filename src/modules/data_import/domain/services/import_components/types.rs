use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::modules::anime::domain::entities::CatalogCounts;

/// Running counters shared by every worker of a run.
#[derive(Debug, Default)]
pub struct ImportStats {
    attempted: AtomicU64,
    imported: AtomicU64,
    errors: AtomicU64,
    not_found: AtomicU64,
    rate_limited: AtomicU64,
    already_present: AtomicU64,
    timing: Mutex<Timing>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Timing {
    started: Option<Instant>,
    start_time: Option<DateTime<Utc>>,
    finished: Option<Instant>,
    end_time: Option<DateTime<Utc>>,
}

impl ImportStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn timing(&self) -> std::sync::MutexGuard<'_, Timing> {
        self.timing.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records the start of the run; later calls keep the first timestamp.
    pub fn mark_started(&self) {
        let mut timing = self.timing();
        if timing.started.is_none() {
            timing.started = Some(Instant::now());
            timing.start_time = Some(Utc::now());
        }
        timing.finished = None;
        timing.end_time = None;
    }

    pub fn mark_finished(&self) {
        let mut timing = self.timing();
        timing.finished = Some(Instant::now());
        timing.end_time = Some(Utc::now());
    }

    pub fn record_attempt(&self) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_imported(&self) {
        self.imported.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_already_present(&self) {
        self.already_present.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the error count including this one.
    pub fn record_error(&self) -> u64 {
        self.errors.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn imported(&self) -> u64 {
        self.imported.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let timing = *self.timing();
        let elapsed = match (timing.started, timing.finished) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        };

        StatsSnapshot {
            attempted: self.attempted.load(Ordering::Relaxed),
            imported: self.imported.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            already_present: self.already_present.load(Ordering::Relaxed),
            start_time: timing.start_time,
            end_time: timing.end_time,
            elapsed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatsSnapshot {
    pub attempted: u64,
    pub imported: u64,
    pub errors: u64,
    pub not_found: u64,
    pub rate_limited: u64,
    pub already_present: u64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub elapsed: Duration,
}

impl StatsSnapshot {
    /// Imported records per second of wall-clock time.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.imported as f64 / secs
        } else {
            0.0
        }
    }
}

/// Result of one fetch-normalize-persist task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Imported,
    /// The record was created concurrently by another task or run.
    AlreadyPresent,
    NotFound,
    RateLimited,
    Failed(String),
    Cancelled,
}

impl TaskOutcome {
    pub fn is_imported(&self) -> bool {
        matches!(self, TaskOutcome::Imported)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CampaignOutcome {
    Completed,
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StrategyStatus {
    /// Target reached.
    Completed,
    /// Candidates ran out before the target.
    Exhausted,
    /// Target already met by a previous run.
    Skipped,
    Failed(String),
    Interrupted,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub name: String,
    pub target: usize,
    pub imported: usize,
    pub status: StrategyStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignReport {
    pub campaign: String,
    pub outcome: CampaignOutcome,
    pub stats: StatsSnapshot,
    pub counts: CatalogCounts,
    pub strategies: Vec<StrategyReport>,
}

impl CampaignReport {
    pub fn throughput(&self) -> f64 {
        self.stats.throughput()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_counter_returns_running_total() {
        let stats = ImportStats::new();
        assert_eq!(stats.record_error(), 1);
        assert_eq!(stats.record_error(), 2);
        assert_eq!(stats.snapshot().errors, 2);
    }

    #[test]
    fn snapshot_reports_elapsed_after_finish() {
        let stats = ImportStats::new();
        stats.mark_started();
        stats.record_imported();
        std::thread::sleep(Duration::from_millis(5));
        stats.mark_finished();

        let snapshot = stats.snapshot();
        assert!(snapshot.elapsed >= Duration::from_millis(5));
        assert!(snapshot.throughput() > 0.0);
        assert!(snapshot.end_time.is_some());
    }

    #[test]
    fn throughput_without_elapsed_is_zero() {
        assert_eq!(StatsSnapshot::default().throughput(), 0.0);
    }
}
