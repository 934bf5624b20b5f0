//! Connection and handler errors

use std::time::Duration;

use tokio_tungstenite::tungstenite;

use crate::protocol::CodecError;

/// Error type returned by event handlers
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by `open()` and outbound frames.
///
/// Anything that happens after the connection is up flows through the
/// status topic instead.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway is already open")]
    AlreadyOpen,

    #[error("Gateway is not open")]
    NotOpen,

    #[error("Failed to connect: {0}")]
    Connect(#[source] Box<tungstenite::Error>),

    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid gateway URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to encode frame: {0}")]
    Encode(#[source] CodecError),

    #[error("Failed to decode frame: {0}")]
    Decode(#[source] CodecError),

    #[error("Failed to send frame: {0}")]
    Send(#[source] Box<tungstenite::Error>),
}

impl GatewayError {
    /// Error code for logging
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyOpen => "ALREADY_OPEN",
            Self::NotOpen => "NOT_OPEN",
            Self::Connect(_) => "CONNECT_FAILED",
            Self::Timeout(_) => "CONNECT_TIMEOUT",
            Self::Url(_) => "INVALID_URL",
            Self::Encode(_) => "ENCODE_FAILED",
            Self::Decode(_) => "DECODE_FAILED",
            Self::Send(_) => "SEND_FAILED",
        }
    }

    /// Dial failures worth another attempt
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Timeout(_) | Self::Send(_))
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure reported to handler error callbacks
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Handler failed: {0}")]
    Failed(#[source] BoxError),

    #[error("Handler panicked: {0}")]
    Panicked(String),

    #[error("Failed to decode {event_type}: {source}")]
    Decode {
        event_type: String,
        #[source]
        source: CodecError,
    },
}

impl HandlerError {
    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}
