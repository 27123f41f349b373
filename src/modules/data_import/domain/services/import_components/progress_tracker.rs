use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::shared::utils::LogContext;
use crate::{log_info, log_warn};

use super::types::StatsSnapshot;

/// Throttles campaign progress lines to whole-percentage steps.
#[derive(Clone)]
pub struct ProgressTracker {
    label: String,
    target: usize,
    batch_config: ProgressBatchConfig,
    last_percentage: Arc<AtomicUsize>,
    last_reported_errors: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct ProgressBatchConfig {
    batch_size: usize,
    min_percentage_change: usize,
}

impl Default for ProgressBatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            min_percentage_change: 1,
        }
    }
}

impl ProgressTracker {
    pub fn new(label: impl Into<String>, target: usize) -> Self {
        Self {
            label: label.into(),
            target,
            batch_config: ProgressBatchConfig::default(),
            last_percentage: Arc::new(AtomicUsize::new(0)),
            last_reported_errors: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_batch_config(mut self, total_items: usize) -> Self {
        self.batch_config.batch_size = std::cmp::max(1, total_items / 50);
        self
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn should_emit_progress(
        &self,
        processed: usize,
        total: usize,
        last_emitted_percentage: &mut usize,
        is_initial: bool,
        is_final: bool,
    ) -> bool {
        let current_percentage = if total > 0 {
            (processed * 100) / total
        } else {
            0
        };
        let should_emit_percentage = current_percentage.saturating_sub(*last_emitted_percentage)
            >= self.batch_config.min_percentage_change;
        let should_emit_batch = processed % self.batch_config.batch_size == 0;

        let should_emit = is_initial || is_final || should_emit_percentage || should_emit_batch;

        if should_emit {
            *last_emitted_percentage = current_percentage;
        }

        should_emit
    }

    /// Logs campaign progress after a batch. Returns whether a line was written.
    pub fn report(&self, strategy: &str, imported_total: usize, stats: &StatsSnapshot) -> bool {
        let mut last = self.last_percentage.load(Ordering::Relaxed);
        let is_final = imported_total >= self.target;
        if !self.should_emit_progress(imported_total, self.target, &mut last, false, is_final) {
            return false;
        }
        self.last_percentage.store(last, Ordering::Relaxed);

        LogContext::import_progress(&self.label, imported_total as u64, self.target as u64);
        log_info!(
            "[{}] strategy={} attempted={} errors={} not_found={} rate_limited={} speed={:.1}/s",
            self.label,
            strategy,
            stats.attempted,
            stats.errors,
            stats.not_found,
            stats.rate_limited,
            stats.throughput()
        );

        let errors = stats.errors as usize;
        let previous = self.last_reported_errors.swap(errors, Ordering::Relaxed);
        if errors > previous && previous > 0 {
            log_warn!("[{}] {} new errors since last report", self.label, errors - previous);
        }
        true
    }
}
