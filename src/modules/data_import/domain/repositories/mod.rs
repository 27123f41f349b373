pub mod checkpoint_store;

pub use checkpoint_store::{CampaignCheckpoint, CheckpointStore};
