pub mod adapters;
pub mod http_client;

// Re-export commonly used types
pub use adapters::{AniListAdapter, ShikimoriAdapter};
pub use http_client::{ClientSettings, RateLimitClient, RetryPolicy};
