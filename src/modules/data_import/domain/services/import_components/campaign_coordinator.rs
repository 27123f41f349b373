use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::modules::anime::domain::entities::CatalogCounts;
use crate::modules::anime::AnimeRepository;
use crate::modules::data_import::domain::repositories::{CampaignCheckpoint, CheckpointStore};
use crate::modules::provider::CatalogSource;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::TimedOperation;
use crate::{log_error, log_info, log_warn};

use super::batch_executor::BatchImporter;
use super::id_generator::{Bucket, CampaignPlan, IdGenerator, StrategyPlan};
use super::progress_tracker::ProgressTracker;
use super::types::{CampaignOutcome, CampaignReport, StrategyReport, StrategyStatus};

/// Listing buckets allowed to fail in a row before the strategy is abandoned.
const MAX_CONSECUTIVE_BUCKET_FAILURES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignMode {
    Staged,
    /// Runs on the ultra profile; refused unless the ban risk is accepted.
    Ultra { accept_ban_risk: bool },
}

impl CampaignMode {
    pub fn label(&self) -> &'static str {
        match self {
            CampaignMode::Staged => "staged",
            CampaignMode::Ultra { .. } => "ultra",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CampaignOptions {
    /// Key the checkpoint is stored under.
    pub campaign: String,
    pub resume: bool,
    pub checkpointing: bool,
}

impl CampaignOptions {
    pub fn new(campaign: impl Into<String>) -> Self {
        Self {
            campaign: campaign.into(),
            resume: false,
            checkpointing: true,
        }
    }

    pub fn resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn without_checkpoints(mut self) -> Self {
        self.checkpointing = false;
        self
    }
}

/// Runs the strategies of a plan in order until each reaches its target.
pub struct CampaignOrchestrator {
    importer: BatchImporter,
    source: Arc<dyn CatalogSource>,
    repository: Arc<dyn AnimeRepository>,
    checkpoints: Arc<dyn CheckpointStore>,
    cancel: CancellationToken,
}

struct StrategyStart {
    index: usize,
    already_imported: usize,
}

impl CampaignOrchestrator {
    pub fn new(
        importer: BatchImporter,
        source: Arc<dyn CatalogSource>,
        repository: Arc<dyn AnimeRepository>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        let cancel = importer.cancellation_token();
        Self {
            importer,
            source,
            repository,
            checkpoints,
            cancel,
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run_campaign(
        &self,
        mode: CampaignMode,
        plan: &CampaignPlan,
        options: &CampaignOptions,
    ) -> AppResult<CampaignReport> {
        if let CampaignMode::Ultra {
            accept_ban_risk: false,
        } = mode
        {
            return Err(AppError::InvalidInput(
                "Ultra mode disables rate limiting and must be explicitly accepted".to_string(),
            ));
        }

        log_info!(
            "Starting {} campaign '{}' with target {} and {} workers",
            mode.label(),
            options.campaign,
            plan.total_target(),
            self.importer.settings().workers
        );
        self.run_plan(plan, options).await
    }

    pub async fn run_plan(
        &self,
        plan: &CampaignPlan,
        options: &CampaignOptions,
    ) -> AppResult<CampaignReport> {
        let timer = TimedOperation::new("campaign");
        let stats = self.importer.stats();
        stats.mark_started();

        let (start, imported_before) = self.starting_point(plan, options).await?;
        let progress = ProgressTracker::new(options.campaign.clone(), plan.total_target())
            .with_batch_config(plan.total_target());

        let mut strategies = Vec::with_capacity(plan.strategies.len());
        for (index, strategy) in plan.strategies.iter().enumerate() {
            if index < start.index {
                strategies.push(StrategyReport {
                    name: strategy.name.clone(),
                    target: strategy.target,
                    imported: 0,
                    status: StrategyStatus::Skipped,
                });
                continue;
            }
            if self.cancel.is_cancelled() {
                break;
            }

            let already = if index == start.index {
                start.already_imported
            } else {
                0
            };

            let report = match self
                .run_strategy(index, strategy, already, imported_before, &progress, options)
                .await
            {
                Ok(report) => report,
                Err(e) if e.is_setup_fault() => {
                    stats.mark_finished();
                    log_error!("Campaign '{}' aborted: {}", options.campaign, e);
                    return Err(e);
                }
                Err(e) => {
                    log_error!("Strategy '{}' failed: {}", strategy.name, e);
                    StrategyReport {
                        name: strategy.name.clone(),
                        target: strategy.target,
                        imported: already,
                        status: StrategyStatus::Failed(e.to_string()),
                    }
                }
            };
            log_info!(
                "Strategy '{}' finished: {}/{} ({:?})",
                report.name,
                report.imported,
                report.target,
                report.status
            );
            if report.status != StrategyStatus::Interrupted {
                self.advance_checkpoint(index + 1, imported_before, options).await;
            }
            strategies.push(report);
        }

        let outcome = if self.cancel.is_cancelled() {
            CampaignOutcome::Interrupted
        } else {
            CampaignOutcome::Completed
        };

        if outcome == CampaignOutcome::Completed && options.checkpointing {
            if let Err(e) = self.checkpoints.clear_checkpoint(&options.campaign).await {
                log_warn!("Could not clear checkpoint '{}': {}", options.campaign, e);
            }
        }

        stats.mark_finished();
        let counts = self.final_counts().await;
        let snapshot = stats.snapshot();
        timer.finish_with_info(&format!(
            "{:?}: imported {} in {:.1}s ({:.2}/s)",
            outcome,
            snapshot.imported,
            snapshot.elapsed.as_secs_f64(),
            snapshot.throughput()
        ));

        Ok(CampaignReport {
            campaign: options.campaign.clone(),
            outcome,
            stats: snapshot,
            counts,
            strategies,
        })
    }

    async fn starting_point(
        &self,
        plan: &CampaignPlan,
        options: &CampaignOptions,
    ) -> AppResult<(StrategyStart, u64)> {
        let fresh = StrategyStart {
            index: 0,
            already_imported: 0,
        };
        if !options.resume || !options.checkpointing {
            return Ok((fresh, 0));
        }

        match self.checkpoints.load_checkpoint(&options.campaign).await? {
            Some(checkpoint) if checkpoint.strategy_index < plan.strategies.len() => {
                log_info!(
                    "Resuming '{}' at strategy {} with {} already imported ({} total)",
                    options.campaign,
                    checkpoint.strategy_index,
                    checkpoint.strategy_imported,
                    checkpoint.total_imported
                );
                Ok((
                    StrategyStart {
                        index: checkpoint.strategy_index,
                        already_imported: checkpoint.strategy_imported,
                    },
                    checkpoint.total_imported,
                ))
            }
            Some(checkpoint) => {
                log_warn!(
                    "Ignoring checkpoint for '{}' at strategy {}: plan has {} strategies",
                    options.campaign,
                    checkpoint.strategy_index,
                    plan.strategies.len()
                );
                Ok((fresh, 0))
            }
            None => {
                log_info!("No checkpoint for '{}', starting fresh", options.campaign);
                Ok((fresh, 0))
            }
        }
    }

    async fn run_strategy(
        &self,
        index: usize,
        strategy: &StrategyPlan,
        already_imported: usize,
        imported_before: u64,
        progress: &ProgressTracker,
        options: &CampaignOptions,
    ) -> AppResult<StrategyReport> {
        let mut imported = already_imported;
        let mut consecutive_failures = 0;
        let chunk_size = self.importer.settings().max_batch_size.max(1);

        log_info!(
            "Strategy '{}' running: target {}, {} already imported",
            strategy.name,
            strategy.target,
            already_imported
        );

        'buckets: for bucket in &strategy.buckets {
            if imported >= strategy.target || self.cancel.is_cancelled() {
                break;
            }

            let ids = match IdGenerator::resolve_bucket(self.source.as_ref(), bucket).await {
                Ok(ids) => {
                    consecutive_failures = 0;
                    ids
                }
                Err(e) => {
                    consecutive_failures += 1;
                    log_warn!(
                        "Bucket '{}' of '{}' failed: {}",
                        bucket.label(),
                        strategy.name,
                        e
                    );
                    if consecutive_failures >= MAX_CONSECUTIVE_BUCKET_FAILURES {
                        return Err(AppError::StrategyFault {
                            strategy: strategy.name.clone(),
                            reason: format!(
                                "{} consecutive buckets failed, last: {}",
                                consecutive_failures, e
                            ),
                        });
                    }
                    continue;
                }
            };

            if let Bucket::Listing { .. } = bucket {
                log_info!("Bucket '{}' yielded {} candidates", bucket.label(), ids.len());
            }

            for chunk in ids.chunks(chunk_size) {
                if imported >= strategy.target || self.cancel.is_cancelled() {
                    break 'buckets;
                }

                imported += self.importer.run_batch(chunk).await?;

                let snapshot = self.importer.stats().snapshot();
                if options.checkpointing {
                    let checkpoint = CampaignCheckpoint::new(
                        &options.campaign,
                        index,
                        imported,
                        imported_before + snapshot.imported,
                    );
                    if let Err(e) = self.checkpoints.save_checkpoint(&checkpoint).await {
                        log_warn!("Could not save checkpoint '{}': {}", options.campaign, e);
                    }
                }
                progress.report(
                    &strategy.name,
                    (imported_before + snapshot.imported) as usize,
                    &snapshot,
                );
            }
        }

        let status = if self.cancel.is_cancelled() {
            StrategyStatus::Interrupted
        } else if imported >= strategy.target {
            StrategyStatus::Completed
        } else {
            StrategyStatus::Exhausted
        };

        Ok(StrategyReport {
            name: strategy.name.clone(),
            target: strategy.target,
            imported,
            status,
        })
    }

    /// Marks every strategy before `next_index` as done.
    async fn advance_checkpoint(
        &self,
        next_index: usize,
        imported_before: u64,
        options: &CampaignOptions,
    ) {
        if !options.checkpointing {
            return;
        }
        let total = imported_before + self.importer.stats().imported();
        let checkpoint = CampaignCheckpoint::new(&options.campaign, next_index, 0, total);
        if let Err(e) = self.checkpoints.save_checkpoint(&checkpoint).await {
            log_warn!("Could not save checkpoint '{}': {}", options.campaign, e);
        }
    }

    async fn final_counts(&self) -> CatalogCounts {
        match self.repository.catalog_counts().await {
            Ok(counts) => counts,
            Err(e) => {
                log_warn!("Could not read catalog counts: {}", e);
                CatalogCounts::default()
            }
        }
    }
}
