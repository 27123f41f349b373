use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::shared::errors::AppResult;

/// Where a campaign stopped: the strategy it was running and how far it got.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignCheckpoint {
    pub campaign: String,
    pub strategy_index: usize,
    pub strategy_imported: usize,
    pub total_imported: u64,
    pub updated_at: DateTime<Utc>,
}

impl CampaignCheckpoint {
    pub fn new(
        campaign: &str,
        strategy_index: usize,
        strategy_imported: usize,
        total_imported: u64,
    ) -> Self {
        Self {
            campaign: campaign.to_string(),
            strategy_index,
            strategy_imported,
            total_imported,
            updated_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn load_checkpoint(&self, campaign: &str) -> AppResult<Option<CampaignCheckpoint>>;

    /// Replaces any checkpoint stored for the same campaign.
    async fn save_checkpoint(&self, checkpoint: &CampaignCheckpoint) -> AppResult<()>;

    async fn clear_checkpoint(&self, campaign: &str) -> AppResult<()>;
}
