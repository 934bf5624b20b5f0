//! Aggregate error for the client handle

use chat_cache::StoreError;
use chat_common::ConfigError;
use chat_gateway::GatewayError;
use chat_rest::RestError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("REST error: {0}")]
    Rest(#[from] RestError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Cache error: {0}")]
    Store(#[from] StoreError),

    #[error("Missing {0}")]
    Missing(&'static str),
}

impl ClientError {
    /// Error code for logging
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Rest(e) if e.is_api_error() => "API_ERROR",
            Self::Rest(_) => "TRANSPORT_ERROR",
            Self::Gateway(e) => e.code(),
            Self::Store(_) => "CACHE_ERROR",
            Self::Missing(_) => "MISSING_DEPENDENCY",
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
