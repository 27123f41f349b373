/// Shared infrastructure concerns
///
/// Infrastructure used by more than one module (connection pool, migrations).
pub mod database;

pub use database::{Database, DbConnection, DbPool};
