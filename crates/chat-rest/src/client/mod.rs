//! Request pipeline and its collaborators

mod cache;
mod rest_client;
mod retry;

pub use cache::CacheWrite;
pub use rest_client::{json_body, RestClient, USER_AGENT};
pub use retry::{IdempotentRetry, NoRetry, RetryPolicy};
