pub mod batch_executor;
pub mod campaign_coordinator;
pub mod id_generator;
pub mod progress_tracker;
pub mod types;

pub use batch_executor::{BatchImporter, BatchSettings};
pub use campaign_coordinator::{CampaignMode, CampaignOptions, CampaignOrchestrator};
pub use id_generator::{Bucket, CampaignPlan, IdGenerator, Strategy, StrategyPlan};
pub use progress_tracker::ProgressTracker;
pub use types::*;
