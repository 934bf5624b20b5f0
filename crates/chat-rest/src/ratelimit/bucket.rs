//! Rate-limit bucket and its lock guard

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::HeaderMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::{sleep, Instant};

use super::{
    capped_wait, GlobalCooldown, HEADER_GLOBAL, HEADER_LIMIT, HEADER_REMAINING, HEADER_RESET,
    HEADER_RESET_AFTER, MAX_RESET_WAIT,
};
use crate::error::RateLimitError;

/// Client-side fixed-window rule for routes whose headers are unreliable.
///
/// Takes precedence over any rate-limit headers the bucket receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomRateLimit {
    /// Matched against the end of the bucket key
    pub suffix: String,
    /// Calls allowed per window
    pub requests: i64,
    /// Window length
    pub reset: Duration,
}

impl CustomRateLimit {
    pub fn new(suffix: impl Into<String>, requests: i64, reset: Duration) -> Self {
        Self {
            suffix: suffix.into(),
            requests,
            reset,
        }
    }
}

/// Mutable accounting guarded by the bucket lock
#[derive(Debug, Clone)]
pub struct BucketState {
    pub remaining: i64,
    pub limit: i64,
    pub reset: Instant,
    /// Start of the current custom window
    last_reset: Option<Instant>,
}

impl BucketState {
    fn new(now: Instant) -> Self {
        Self {
            remaining: 1,
            limit: 1,
            reset: now,
            last_reset: None,
        }
    }

    /// Time until the bucket may be used again, ignoring the global cooldown
    pub fn wait_time(&self, now: Instant) -> Duration {
        if self.remaining < 1 && self.reset > now {
            self.reset - now
        } else {
            Duration::ZERO
        }
    }
}

/// Rate-limit domain for every route sharing a first path segment
#[derive(Debug)]
pub struct Bucket {
    key: String,
    state: Arc<Mutex<BucketState>>,
    global: GlobalCooldown,
    custom: Option<CustomRateLimit>,
}

impl Bucket {
    pub(crate) fn new(
        key: impl Into<String>,
        global: GlobalCooldown,
        custom: Option<CustomRateLimit>,
    ) -> Self {
        Self {
            key: key.into(),
            state: Arc::new(Mutex::new(BucketState::new(Instant::now()))),
            global,
            custom,
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn custom(&self) -> Option<&CustomRateLimit> {
        self.custom.as_ref()
    }

    /// Combined wait: the bucket's own reset first, then the global cooldown
    pub fn wait_time(&self, state: &BucketState, now: Instant) -> Duration {
        let own = state.wait_time(now);
        if own.is_zero() {
            self.global.wait_time(now)
        } else {
            own
        }
    }

    /// Snapshot of the current accounting (waits for the lock)
    pub async fn snapshot(&self) -> BucketState {
        self.state.lock().await.clone()
    }

    /// Take the bucket lock, wait out any reset or global cooldown, then spend one call
    pub async fn lock(self: &Arc<Self>) -> BucketGuard {
        let mut state = Arc::clone(&self.state).lock_owned().await;

        loop {
            let wait = self.wait_time(&state, Instant::now());
            if wait.is_zero() {
                break;
            }
            tracing::debug!(
                bucket = %self.key,
                wait_ms = wait.as_millis() as u64,
                "Waiting for rate limit"
            );
            sleep(wait).await;
        }

        state.remaining -= 1;

        BucketGuard {
            bucket: Arc::clone(self),
            state,
        }
    }
}

/// Exclusive hold on a bucket; dropping it unlocks without updating accounting
#[derive(Debug)]
pub struct BucketGuard {
    bucket: Arc<Bucket>,
    state: OwnedMutexGuard<BucketState>,
}

impl BucketGuard {
    #[inline]
    pub fn bucket(&self) -> &Arc<Bucket> {
        &self.bucket
    }

    #[inline]
    pub fn state(&self) -> &BucketState {
        &self.state
    }

    /// Update accounting from response headers (`None` after a failed call) and unlock.
    ///
    /// Malformed headers are logged and skipped; the rest still apply.
    pub fn release(mut self, headers: Option<&HeaderMap>) {
        let now = Instant::now();

        if let Some(rule) = &self.bucket.custom {
            let expired = self
                .state
                .last_reset
                .map_or(true, |start| now.saturating_duration_since(start) >= rule.reset);
            if expired {
                self.state.remaining = rule.requests - 1;
                self.state.last_reset = Some(now);
            }
            if self.state.remaining < 1 {
                self.state.reset = now.checked_add(rule.reset).unwrap_or(now + MAX_RESET_WAIT);
            }
            return;
        }

        let Some(headers) = headers else {
            return;
        };

        let key = &self.bucket.key;
        let remaining = header_str(headers, HEADER_REMAINING)
            .and_then(|raw| logged(key, parse_i64(HEADER_REMAINING, raw)));
        let limit = header_str(headers, HEADER_LIMIT)
            .and_then(|raw| logged(key, parse_i64(HEADER_LIMIT, raw)));
        let reset_after = header_str(headers, HEADER_RESET_AFTER).and_then(|raw| {
            logged(key, parse_wait(HEADER_RESET_AFTER, raw, |millis| millis / 1000.0))
        });
        let reset = header_str(headers, HEADER_RESET).and_then(|raw| {
            let now_secs = Utc::now().timestamp_millis() as f64 / 1000.0;
            logged(key, parse_wait(HEADER_RESET, raw, |epoch| epoch - now_secs))
        });
        let global = headers.contains_key(HEADER_GLOBAL);

        if let Some(wait) = reset_after.or(reset) {
            let reset_at = now + wait;
            if global {
                self.bucket.global.set_until(reset_at);
            } else {
                self.state.reset = reset_at;
            }
        }
        if let Some(remaining) = remaining {
            self.state.remaining = remaining;
        }
        if let Some(limit) = limit {
            self.state.limit = limit;
        }

        tracing::trace!(
            bucket = %self.bucket.key,
            remaining = self.state.remaining,
            global,
            "Bucket released"
        );
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn parse_i64(name: &'static str, raw: &str) -> Result<i64, RateLimitError> {
    raw.trim().parse().map_err(|_| invalid(name, raw))
}

/// Parse a numeric header and turn it into a capped wait via `to_secs`
fn parse_wait(
    name: &'static str,
    raw: &str,
    to_secs: impl FnOnce(f64) -> f64,
) -> Result<Duration, RateLimitError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(|value| capped_wait(to_secs(value)))
        .ok_or_else(|| invalid(name, raw))
}

fn invalid(name: &'static str, raw: &str) -> RateLimitError {
    RateLimitError::InvalidHeader {
        name,
        value: raw.to_string(),
    }
}

fn logged<T>(bucket: &str, parsed: Result<T, RateLimitError>) -> Option<T> {
    parsed
        .map_err(|e| tracing::warn!(bucket, error = %e, "Ignoring malformed rate-limit header"))
        .ok()
}
