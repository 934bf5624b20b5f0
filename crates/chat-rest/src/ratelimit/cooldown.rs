//! Process-wide rate-limit cooldown

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
struct Inner {
    origin: Instant,
    /// Deadline as nanoseconds after `origin`; 0 means unset
    until_nanos: AtomicI64,
}

/// Deadline shared by every bucket of a limiter.
///
/// Cloning shares the same deadline. Read without holding any bucket lock.
#[derive(Debug, Clone)]
pub struct GlobalCooldown {
    inner: Arc<Inner>,
}

impl Default for GlobalCooldown {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalCooldown {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                origin: Instant::now(),
                until_nanos: AtomicI64::new(0),
            }),
        }
    }

    /// Block all buckets until `deadline`. An earlier deadline never shortens a later one.
    pub fn set_until(&self, deadline: Instant) {
        let nanos = deadline
            .saturating_duration_since(self.inner.origin)
            .as_nanos()
            .clamp(1, i64::MAX as u128) as i64;
        self.inner.until_nanos.fetch_max(nanos, Ordering::AcqRel);
        tracing::warn!(
            cooldown_ms = deadline.saturating_duration_since(Instant::now()).as_millis() as u64,
            "Global rate limit engaged"
        );
    }

    /// Current deadline, if one was ever set
    pub fn until(&self) -> Option<Instant> {
        match self.inner.until_nanos.load(Ordering::Acquire) {
            0 => None,
            nanos => Some(self.inner.origin + Duration::from_nanos(nanos as u64)),
        }
    }

    /// Time left before the cooldown elapses
    pub fn wait_time(&self, now: Instant) -> Duration {
        self.until()
            .map_or(Duration::ZERO, |until| until.saturating_duration_since(now))
    }
}
