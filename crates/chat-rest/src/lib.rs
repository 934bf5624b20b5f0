//! # chat-rest
//!
//! Rate-limited REST transport.
//!
//! ## Features
//!
//! - **Rate Limiter**: Per-route-prefix buckets plus a shared global cooldown
//! - **Request Pipeline**: Bounded retries on 502/429, typed error classification
//! - **Endpoints**: Thin typed calls that write users and emojis through to the cache
//!
//! ## Example
//!
//! ```ignore
//! use chat_rest::RestClient;
//!
//! let rest = RestClient::new(&config.api, config.token.clone())?.with_state(state);
//! let me = rest.fetch_self().await?;
//! rest.send_message(&channel_id, SendMessage::new("hello")).await?;
//! ```

pub mod client;
pub mod endpoints;
pub mod error;
pub mod ratelimit;

pub use client::{json_body, CacheWrite, IdempotentRetry, NoRetry, RestClient, RetryPolicy};
pub use endpoints::NodeInfo;
pub use error::{RateLimitError, RestError, RestResult};
pub use ratelimit::{
    bucket_key, Bucket, BucketGuard, BucketState, CustomRateLimit, GlobalCooldown, RateLimiter,
    MAX_RESET_WAIT,
};
