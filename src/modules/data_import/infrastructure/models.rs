use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::modules::data_import::domain::repositories::CampaignCheckpoint;
use crate::schema::import_checkpoints;

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = import_checkpoints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CheckpointRow {
    pub campaign: String,
    pub strategy_index: i32,
    pub strategy_imported: i64,
    pub total_imported: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<&CampaignCheckpoint> for CheckpointRow {
    fn from(checkpoint: &CampaignCheckpoint) -> Self {
        Self {
            campaign: checkpoint.campaign.clone(),
            strategy_index: checkpoint.strategy_index as i32,
            strategy_imported: checkpoint.strategy_imported as i64,
            total_imported: checkpoint.total_imported as i64,
            updated_at: checkpoint.updated_at,
        }
    }
}

impl From<CheckpointRow> for CampaignCheckpoint {
    fn from(row: CheckpointRow) -> Self {
        Self {
            campaign: row.campaign,
            strategy_index: row.strategy_index.max(0) as usize,
            strategy_imported: row.strategy_imported.max(0) as usize,
            total_imported: row.total_imported.max(0) as u64,
            updated_at: row.updated_at,
        }
    }
}
