//! Per-route rate limiting
//!
//! Buckets are keyed by the first path segment of a route. Each bucket has its own
//! lock; the map of buckets has another. A single [`GlobalCooldown`] is shared by
//! every bucket of a limiter.

use std::time::Duration;

mod bucket;
mod cooldown;
mod limiter;

pub use bucket::{Bucket, BucketGuard, BucketState, CustomRateLimit};
pub use cooldown::GlobalCooldown;
pub use limiter::{bucket_key, RateLimiter};

/// Calls left in the current window
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
/// Window size
pub const HEADER_LIMIT: &str = "x-ratelimit-limit";
/// Absolute reset time, epoch seconds
pub const HEADER_RESET: &str = "x-ratelimit-reset";
/// Relative reset time, milliseconds
pub const HEADER_RESET_AFTER: &str = "x-ratelimit-reset-after";
/// Present when the limit applies to every route
pub const HEADER_GLOBAL: &str = "x-ratelimit-global";

/// Longest wait taken from a server-supplied reset or retry hint
pub const MAX_RESET_WAIT: Duration = Duration::from_secs(60 * 60);

/// Server-supplied seconds as a wait, clamped to `0..=MAX_RESET_WAIT`. `None` for NaN.
pub(crate) fn capped_wait(secs: f64) -> Option<Duration> {
    if secs.is_nan() {
        return None;
    }
    Duration::try_from_secs_f64(secs.clamp(0.0, MAX_RESET_WAIT.as_secs_f64())).ok()
}
