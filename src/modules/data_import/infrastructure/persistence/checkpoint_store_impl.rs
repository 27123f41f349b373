use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use tokio::task;

use crate::modules::data_import::domain::repositories::{CampaignCheckpoint, CheckpointStore};
use crate::modules::data_import::infrastructure::models::CheckpointRow;
use crate::schema::import_checkpoints;
use crate::shared::errors::AppResult;
use crate::shared::Database;

/// Checkpoints kept in the `import_checkpoints` table, one row per campaign.
pub struct CheckpointStoreImpl {
    db: Arc<Database>,
}

impl CheckpointStoreImpl {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CheckpointStore for CheckpointStoreImpl {
    async fn load_checkpoint(&self, campaign: &str) -> AppResult<Option<CampaignCheckpoint>> {
        let db = Arc::clone(&self.db);
        let campaign = campaign.to_string();

        task::spawn_blocking(move || -> AppResult<Option<CampaignCheckpoint>> {
            let mut conn = db.get_connection()?;
            let row = import_checkpoints::table
                .find(&campaign)
                .select(CheckpointRow::as_select())
                .first(&mut conn)
                .optional()?;
            Ok(row.map(CampaignCheckpoint::from))
        })
        .await?
    }

    async fn save_checkpoint(&self, checkpoint: &CampaignCheckpoint) -> AppResult<()> {
        let db = Arc::clone(&self.db);
        let row = CheckpointRow::from(checkpoint);

        task::spawn_blocking(move || -> AppResult<()> {
            let mut conn = db.get_connection()?;
            diesel::insert_into(import_checkpoints::table)
                .values(&row)
                .on_conflict(import_checkpoints::campaign)
                .do_update()
                .set(&row)
                .execute(&mut conn)?;
            Ok(())
        })
        .await?
    }

    async fn clear_checkpoint(&self, campaign: &str) -> AppResult<()> {
        let db = Arc::clone(&self.db);
        let campaign = campaign.to_string();

        task::spawn_blocking(move || -> AppResult<()> {
            let mut conn = db.get_connection()?;
            diesel::delete(import_checkpoints::table.find(&campaign)).execute(&mut conn)?;
            Ok(())
        })
        .await?
    }
}
