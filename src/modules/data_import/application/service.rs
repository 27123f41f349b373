use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::modules::anime::domain::entities::CatalogCounts;
use crate::modules::anime::domain::services::poster_resolver::lookup_fallback;
use crate::modules::anime::{
    AnimeRepository, AnimeRepositoryImpl, InMemoryAnimeRepository, RecordNormalizer,
};
use crate::modules::data_import::domain::services::import_components::{
    BatchImporter, BatchSettings, CampaignMode, CampaignOptions, CampaignOrchestrator,
    CampaignPlan, CampaignReport, Strategy,
};
use crate::modules::data_import::domain::CheckpointStore;
use crate::modules::data_import::infrastructure::{CheckpointStoreImpl, InMemoryCheckpointStore};
use crate::modules::provider::{AniListAdapter, CatalogSource, PosterSource, ShikimoriAdapter};
use crate::shared::config::{ImportProfile, IngestConfig};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::Database;
use crate::{log_info, log_warn};

/// Collaborators the import pipeline runs against.
#[derive(Clone)]
pub struct ImportBackends {
    pub source: Arc<dyn CatalogSource>,
    pub poster_source: Option<Arc<dyn PosterSource>>,
    pub repository: Arc<dyn AnimeRepository>,
    pub checkpoints: Arc<dyn CheckpointStore>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PosterRefreshReport {
    pub checked: usize,
    pub updated: usize,
    pub unresolved: usize,
}

/// Entry point for campaigns, single-strategy imports and catalog upkeep.
#[derive(Clone)]
pub struct MassImportService {
    backends: ImportBackends,
    normalizer: RecordNormalizer,
    profile: ImportProfile,
    cancel: CancellationToken,
}

impl MassImportService {
    pub fn new(backends: ImportBackends, base_url: &str, profile: ImportProfile) -> Self {
        let mut normalizer = RecordNormalizer::new(base_url);
        if let Some(poster_source) = &backends.poster_source {
            normalizer = normalizer.with_poster_source(poster_source.clone());
        }

        Self {
            backends,
            normalizer,
            profile,
            cancel: CancellationToken::new(),
        }
    }

    /// Builds the HTTP adapters and the persistence layer. A dry run keeps
    /// everything in memory and never touches the database.
    pub fn connect(config: &IngestConfig, profile: ImportProfile, dry_run: bool) -> AppResult<Self> {
        config.validate()?;

        let shikimori = ShikimoriAdapter::new(config, &profile)?;
        let anilist = AniListAdapter::new(config)?;

        let (repository, checkpoints): (Arc<dyn AnimeRepository>, Arc<dyn CheckpointStore>) =
            if dry_run {
                log_warn!("Dry run: records are kept in memory and discarded on exit");
                (
                    Arc::new(InMemoryAnimeRepository::new()),
                    Arc::new(InMemoryCheckpointStore::new()),
                )
            } else {
                let url = config.require_database_url()?;
                let db = Arc::new(Database::connect(url, profile.workers)?);
                db.run_migrations()?;
                (
                    Arc::new(AnimeRepositoryImpl::new(db.clone())),
                    Arc::new(CheckpointStoreImpl::new(db)),
                )
            };

        let backends = ImportBackends {
            source: Arc::new(shikimori),
            poster_source: Some(Arc::new(anilist)),
            repository,
            checkpoints,
        };

        Ok(Self::new(backends, &config.shikimori_base_url, profile))
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn profile(&self) -> &ImportProfile {
        &self.profile
    }

    fn orchestrator(&self) -> CampaignOrchestrator {
        let importer = BatchImporter::new(
            self.backends.source.clone(),
            self.normalizer.clone(),
            self.backends.repository.clone(),
            BatchSettings::from_profile(&self.profile),
        )
        .with_cancellation(self.cancel.clone());

        CampaignOrchestrator::new(
            importer,
            self.backends.source.clone(),
            self.backends.repository.clone(),
            self.backends.checkpoints.clone(),
        )
    }

    /// Full staged campaign toward `target` records.
    pub async fn run_mass_import(
        &self,
        mode: CampaignMode,
        target: usize,
        seed: u64,
        resume: bool,
    ) -> AppResult<CampaignReport> {
        let wants_ultra = matches!(mode, CampaignMode::Ultra { .. });
        if wants_ultra != self.profile.is_ultra() {
            return Err(AppError::ConfigError(format!(
                "{} campaign requested on a {:?} profile",
                mode.label(),
                self.profile.kind
            )));
        }

        let plan = CampaignPlan::staged(target, seed);
        let options = CampaignOptions::new(format!("mass-{}", mode.label())).resume(resume);
        self.orchestrator().run_campaign(mode, &plan, &options).await
    }

    /// One strategy capped at `limit` imports; not checkpointed.
    pub async fn import_strategy(
        &self,
        strategy: &Strategy,
        limit: usize,
    ) -> AppResult<CampaignReport> {
        let plan = CampaignPlan::single(strategy, limit);
        let options = CampaignOptions::new(format!("import-{}", strategy.name())).without_checkpoints();
        self.orchestrator().run_plan(&plan, &options).await
    }

    /// Re-runs the fallback poster lookup for records still on the missing
    /// marker.
    pub async fn refresh_posters(&self, limit: usize) -> AppResult<PosterRefreshReport> {
        let Some(poster_source) = self.backends.poster_source.clone() else {
            return Err(AppError::ConfigError("No fallback poster source configured".into()));
        };

        let missing = self.backends.repository.find_missing_posters(limit).await?;
        log_info!("Refreshing posters for {} records", missing.len());

        let mut report = PosterRefreshReport::default();
        for record in missing {
            if self.cancel.is_cancelled() {
                break;
            }
            report.checked += 1;

            match lookup_fallback(&record.titles, poster_source.as_ref()).await {
                Some(url) => {
                    if self
                        .backends
                        .repository
                        .update_poster(record.external_id, &url)
                        .await?
                    {
                        report.updated += 1;
                    }
                }
                None => report.unresolved += 1,
            }
        }

        log_info!(
            "Poster refresh: {} checked, {} updated, {} unresolved",
            report.checked,
            report.updated,
            report.unresolved
        );
        Ok(report)
    }

    pub async fn catalog_counts(&self) -> AppResult<CatalogCounts> {
        self.backends.repository.catalog_counts().await
    }
}
