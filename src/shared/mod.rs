// Shared kernel used by every module

pub mod config; // Environment configuration and import profiles
pub mod errors; // Shared error types
pub mod infrastructure; // Connection pool and migrations
pub mod utils; // Logging helpers

pub use config::{ImportProfile, IngestConfig, ProfileKind};
pub use infrastructure::database::Database;
