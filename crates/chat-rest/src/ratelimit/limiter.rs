//! Bucket registry

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Bucket, BucketGuard, CustomRateLimit, GlobalCooldown};

/// Bucket key for a route: its first `/`-delimited segment, query string ignored
pub fn bucket_key(route: &str) -> &str {
    let path = route.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_start_matches('/');
    path.split('/').next().unwrap_or_default()
}

/// Per-route rate limiter.
///
/// Buckets are created on first use and live as long as the limiter. The map lock is
/// held only for lookup/creation, so unrelated routes never serialize on each other.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Arc<Bucket>>>,
    global: GlobalCooldown,
    custom: Vec<CustomRateLimit>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(GlobalCooldown::new())
    }
}

impl RateLimiter {
    /// Create a limiter whose buckets all honour `global`
    #[must_use]
    pub fn new(global: GlobalCooldown) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            global,
            custom: Vec::new(),
        }
    }

    /// Register fixed-window rules; only buckets created afterwards pick them up
    #[must_use]
    pub fn with_custom_limits(mut self, rules: impl IntoIterator<Item = CustomRateLimit>) -> Self {
        self.custom.extend(rules);
        self
    }

    #[inline]
    pub fn global(&self) -> &GlobalCooldown {
        &self.global
    }

    /// Get or create the bucket for `route`
    pub fn get_bucket(&self, route: &str) -> Arc<Bucket> {
        let key = bucket_key(route);
        let mut buckets = self.buckets.lock();

        if let Some(bucket) = buckets.get(key) {
            return Arc::clone(bucket);
        }

        let custom = self
            .custom
            .iter()
            .find(|rule| key.ends_with(rule.suffix.as_str()))
            .cloned();
        let bucket = Arc::new(Bucket::new(key, self.global.clone(), custom));
        buckets.insert(key.to_string(), Arc::clone(&bucket));

        tracing::trace!(bucket = %key, "Rate limit bucket created");

        bucket
    }

    /// Lock the bucket for `route`
    pub async fn lock_bucket(&self, route: &str) -> BucketGuard {
        let bucket = self.get_bucket(route);
        self.lock_bucket_object(&bucket).await
    }

    /// Lock an already looked-up bucket (used on retries)
    pub async fn lock_bucket_object(&self, bucket: &Arc<Bucket>) -> BucketGuard {
        bucket.lock().await
    }

    /// Number of buckets created so far
    pub fn len(&self) -> usize {
        self.buckets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
