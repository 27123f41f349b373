pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-exports for easy external access
pub use application::{ImportBackends, MassImportService, PosterRefreshReport};
pub use domain::{
    BatchImporter, BatchSettings, CampaignCheckpoint, CampaignMode, CampaignOptions,
    CampaignOrchestrator, CampaignPlan, CheckpointStore, IdGenerator, Strategy,
};
pub use infrastructure::{CheckpointStoreImpl, InMemoryCheckpointStore};

// Re-export common types for shorter imports
pub use domain::services::import_components::types::{
    CampaignOutcome, CampaignReport, ImportStats, StatsSnapshot, StrategyReport, StrategyStatus,
    TaskOutcome,
};
