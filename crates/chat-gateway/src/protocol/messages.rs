//! Gateway message format
//!
//! Every frame on the wire is a map tagged by its `type` field.

use serde::{Deserialize, Serialize};

/// Frames sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    Authenticate { token: String },
    /// Heartbeat carrying the current unix time in seconds
    Ping { data: i64 },
    BeginTyping { channel: String },
    EndTyping { channel: String },
}

impl ClientFrame {
    #[must_use]
    pub fn authenticate(token: impl Into<String>) -> Self {
        Self::Authenticate {
            token: token.into(),
        }
    }

    /// Heartbeat stamped with the current time
    #[must_use]
    pub fn ping() -> Self {
        Self::Ping {
            data: chrono::Utc::now().timestamp(),
        }
    }

    #[must_use]
    pub fn begin_typing(channel: impl Into<String>) -> Self {
        Self::BeginTyping {
            channel: channel.into(),
        }
    }

    #[must_use]
    pub fn end_typing(channel: impl Into<String>) -> Self {
        Self::EndTyping {
            channel: channel.into(),
        }
    }

    /// Wire discriminator
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authenticate { .. } => "Authenticate",
            Self::Ping { .. } => "Ping",
            Self::BeginTyping { .. } => "BeginTyping",
            Self::EndTyping { .. } => "EndTyping",
        }
    }
}

/// The two fields the read loop needs from every inbound frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// Synthetic discriminator used when a frame cannot be decoded
    pub const INTERNAL_ERROR: &'static str = "InternalError";

    /// Envelope standing in for an undecodable frame
    #[must_use]
    pub fn internal_error() -> Self {
        Self {
            event_type: Self::INTERNAL_ERROR.to_string(),
            error: None,
        }
    }

    /// The effective error name: the `error` field of an `Error` frame, else the type
    #[must_use]
    pub fn kind(&self) -> &str {
        if self.event_type == "Error" {
            self.error.as_deref().unwrap_or_default()
        } else {
            &self.event_type
        }
    }
}
