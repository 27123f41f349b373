pub mod rate_limit_client;
pub mod retry_policy;

pub use rate_limit_client::{ClientSettings, RateLimitClient};
pub use retry_policy::{RateLimitInfo, RetryPolicy};
