use async_trait::async_trait;
use dashmap::DashMap;

use crate::modules::data_import::domain::repositories::{CampaignCheckpoint, CheckpointStore};
use crate::shared::errors::AppResult;

/// Checkpoints that live for the process only.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    checkpoints: DashMap<String, CampaignCheckpoint>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load_checkpoint(&self, campaign: &str) -> AppResult<Option<CampaignCheckpoint>> {
        Ok(self.checkpoints.get(campaign).map(|c| c.clone()))
    }

    async fn save_checkpoint(&self, checkpoint: &CampaignCheckpoint) -> AppResult<()> {
        self.checkpoints
            .insert(checkpoint.campaign.clone(), checkpoint.clone());
        Ok(())
    }

    async fn clear_checkpoint(&self, campaign: &str) -> AppResult<()> {
        self.checkpoints.remove(campaign);
        Ok(())
    }
}
