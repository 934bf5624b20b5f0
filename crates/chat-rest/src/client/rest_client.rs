//! Request pipeline
//!
//! Every call is bound to the rate-limit bucket of its route. Transient statuses
//! (502, 429) re-lock the same bucket and retry with a `2^sequence * 100ms` delay.

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use chat_cache::SharedState;
use chat_common::{ApiConfig, Token};
use chat_core::ApiError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use url::Url;

use super::cache::CacheWrite;
use super::retry::{IdempotentRetry, RetryPolicy};
use crate::error::{RestError, RestResult};
use crate::ratelimit::{capped_wait, GlobalCooldown, RateLimiter};

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("chat-rest/", env!("CARGO_PKG_VERSION"));

/// Base delay for status-driven retries
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// Body of a 429 response
#[derive(Debug, Deserialize)]
struct RateLimitedBody {
    /// Milliseconds
    retry_after: f64,
}

/// Rate-limited REST client.
///
/// Cheap to clone; clones share the HTTP pool, the limiter and the cache.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    token: Token,
    limiter: Arc<RateLimiter>,
    retry: Arc<dyn RetryPolicy>,
    max_retries: u32,
    retry_on_rate_limit: bool,
    state: Option<Arc<SharedState>>,
}

impl RestClient {
    /// Create a client with its own limiter and the default retry policy
    pub fn new(config: &ApiConfig, token: Token) -> RestResult<Self> {
        let mut base_url = Url::parse(&config.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url,
            token,
            limiter: Arc::new(RateLimiter::new(GlobalCooldown::new())),
            retry: Arc::new(IdempotentRetry::new(config.transport_retries)),
            max_retries: config.max_retries,
            retry_on_rate_limit: config.retry_on_rate_limit,
            state: None,
        })
    }

    /// Share a rate limiter (and its global cooldown) with other clients
    #[must_use]
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry = Arc::new(policy);
        self
    }

    #[must_use]
    pub fn with_shared_retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry = policy;
        self
    }

    /// Write cacheable results through to `state`
    #[must_use]
    pub fn with_state(mut self, state: Arc<SharedState>) -> Self {
        self.state = Some(state);
        self
    }

    #[inline]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Decode a JSON result
    pub async fn request_json<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> RestResult<T>
    where
        T: DeserializeOwned,
    {
        let bytes = self.execute(method, path, body).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Decode a JSON result and copy it into the shared state in the background
    pub async fn request_cached<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> RestResult<T>
    where
        T: DeserializeOwned + CacheWrite,
    {
        let value: T = self.request_json(method, path, body).await?;

        if let Some(state) = &self.state {
            let state = Arc::clone(state);
            let cached = value.clone();
            tokio::spawn(async move {
                if let Err(e) = cached.write_to(&state) {
                    tracing::debug!(error = %e, "Cache write skipped");
                }
            });
        }

        Ok(value)
    }

    /// Raw response body, no decoding
    pub async fn request_bytes(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> RestResult<Vec<u8>> {
        self.execute(method, path, body).await
    }

    /// Discard the response body
    pub async fn request_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> RestResult<()> {
        self.execute(method, path, body).await.map(|_| ())
    }

    /// Run one call through the bucket, retry and classification steps
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> RestResult<Vec<u8>> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        let bucket = self.limiter.get_bucket(path);
        let mut sequence: u32 = 0;

        loop {
            let guard = self.limiter.lock_bucket_object(&bucket).await;

            if sequence > 0 {
                let delay = RETRY_BASE_DELAY * 2u32.saturating_pow(sequence);
                tracing::debug!(route = %path, sequence, delay_ms = delay.as_millis() as u64, "Retrying request");
                sleep(delay).await;
            }

            let response = match self.send(&method, &url, body.as_deref()).await {
                Ok(response) => response,
                Err(e) => {
                    guard.release(None);
                    tracing::warn!(method = %method, route = %path, error = %e, "Request failed");
                    return Err(e.into());
                }
            };

            let status = response.status();
            guard.release(Some(response.headers()));

            tracing::debug!(method = %method, route = %path, status = status.as_u16(), sequence, "Response received");

            match status {
                s if s.is_success() => return Ok(response.bytes().await?.to_vec()),
                StatusCode::BAD_GATEWAY => {
                    if sequence < self.max_retries {
                        tracing::warn!(route = %path, sequence, "Upstream unavailable, retrying");
                        sequence += 1;
                        continue;
                    }
                    return Err(RestError::ExceededRetries {
                        status: status.as_u16(),
                        attempts: sequence + 1,
                    });
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = retry_after(response).await;
                    if self.retry_on_rate_limit && sequence < self.max_retries {
                        tracing::warn!(
                            route = %path,
                            retry_after_ms = retry_after.as_millis() as u64,
                            "Rate limited, waiting"
                        );
                        sleep(retry_after).await;
                        sequence += 1;
                        continue;
                    }
                    return Err(RestError::RateLimited { retry_after });
                }
                StatusCode::UNAUTHORIZED => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(RestError::Unauthorized { body });
                }
                _ => {
                    let bytes = response.bytes().await?;
                    let error = serde_json::from_slice::<ApiError>(&bytes).unwrap_or_else(|e| {
                        tracing::debug!(error = %e, "Unreadable error body");
                        ApiError::Unknown
                    });
                    return Err(RestError::Api {
                        status: status.as_u16(),
                        error,
                    });
                }
            }
        }
    }

    /// One HTTP exchange, with transport-level retries per the policy
    async fn send(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&[u8]>,
    ) -> Result<Response, reqwest::Error> {
        let mut backoff = self.retry.backoff();
        let mut attempt = 0;

        loop {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .header(self.token.header_name(), self.token.as_str());
            if let Some(body) = body {
                request = request
                    .header(CONTENT_TYPE, "application/json")
                    .body(body.to_vec());
            }

            match request.send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.retry.max_retries() && self.retry.is_retryable(method, &e) => {
                    let Some(wait) = backoff.next_backoff() else {
                        return Err(e);
                    };
                    attempt += 1;
                    tracing::warn!(url = %url, attempt, error = %e, "Transport error, retrying");
                    sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Serialize a JSON request body
pub fn json_body<B: Serialize + ?Sized>(body: &B) -> RestResult<Vec<u8>> {
    Ok(serde_json::to_vec(body)?)
}

/// Wait requested by a 429 body; zero when the body is unreadable
async fn retry_after(response: Response) -> Duration {
    let parsed = match response.bytes().await {
        Ok(bytes) => parse_retry_after(&bytes),
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable rate-limit body");
            None
        }
    };
    parsed.unwrap_or(Duration::ZERO)
}

fn parse_retry_after(bytes: &[u8]) -> Option<Duration> {
    match serde_json::from_slice::<RateLimitedBody>(bytes) {
        Ok(body) => capped_wait(body.retry_after / 1000.0),
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable rate-limit body");
            None
        }
    }
}
