pub mod repositories;
pub mod services;

// Re-exports for easy access
pub use repositories::{CampaignCheckpoint, CheckpointStore};
pub use services::import_components::{
    BatchImporter, BatchSettings, CampaignMode, CampaignOptions, CampaignOrchestrator,
    CampaignPlan, IdGenerator, ProgressTracker, Strategy,
};
