//! REST pipeline errors
//!
//! Callers branch on [`RestError::is_api_error`] versus
//! [`RestError::is_transport_error`]; API errors are never retried.

use std::time::Duration;

use chat_core::ApiError;

/// Malformed rate-limit header; logged by the bucket and skipped
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Invalid {name} header: {value}")]
    InvalidHeader { name: &'static str, value: String },
}

/// Error returned by the request pipeline
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Unauthorized: {body}")]
    Unauthorized { body: String },

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Exceeded retries after {attempts} attempts (last status {status})")]
    ExceededRetries { status: u16, attempts: u32 },

    #[error("API error ({status}): {error}")]
    Api { status: u16, error: ApiError },
}

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

impl RestError {
    /// The service answered with a typed error body
    pub fn is_api_error(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Unauthorized { .. })
    }

    /// The call never produced a usable response
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::RateLimited { .. } | Self::ExceededRetries { .. }
        )
    }

    /// Whether trying again later may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } | Self::ExceededRetries { .. } => true,
            _ => false,
        }
    }

    /// Typed API error, if any
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api { error, .. } => Some(error),
            _ => None,
        }
    }

    /// HTTP status associated with this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::ExceededRetries { status, .. } => Some(*status),
            Self::Unauthorized { .. } => Some(401),
            Self::RateLimited { .. } => Some(429),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
