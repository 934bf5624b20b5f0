//! Transport-level retry policy
//!
//! Applies only to sends that never produced a response. Status-based retries
//! (502, 429) are the pipeline's own concern.

use std::time::Duration;

use backoff::ExponentialBackoff;
use reqwest::Method;

/// Decides whether a failed send is attempted again
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Whether `error` on a `method` request may be retried
    fn is_retryable(&self, method: &Method, error: &reqwest::Error) -> bool;

    /// Upper bound on transport retries per attempt
    fn max_retries(&self) -> u32;

    /// Fresh backoff schedule for one attempt
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(2),
            max_elapsed_time: Some(Duration::from_secs(10)),
            ..Default::default()
        }
    }
}

/// Retries connect/timeout failures of idempotent methods
#[derive(Debug, Clone)]
pub struct IdempotentRetry {
    max_retries: u32,
}

impl IdempotentRetry {
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }
}

impl Default for IdempotentRetry {
    fn default() -> Self {
        Self::new(2)
    }
}

impl RetryPolicy for IdempotentRetry {
    fn is_retryable(&self, method: &Method, error: &reqwest::Error) -> bool {
        is_idempotent(method) && (error.is_connect() || error.is_timeout())
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Never retries at the transport level
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn is_retryable(&self, _method: &Method, _error: &reqwest::Error) -> bool {
        false
    }

    fn max_retries(&self) -> u32 {
        0
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS
    )
}
