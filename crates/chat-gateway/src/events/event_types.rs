//! Gateway event types
//!
//! Discriminators carried in the `type` field of inbound frames.

use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;

/// Known inbound discriminators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayEventType {
    // Connection events
    Authenticated,
    Ready,
    Pong,
    Error,

    // Envelopes
    /// Batch of events under `v`
    Bulk,
    /// Session event nested under `event_type`
    Auth,
    DeleteSession,
    DeleteAllSessions,

    // Message events
    Message,
    MessageUpdate,
    MessageDelete,

    // Channel events
    ChannelCreate,
    ChannelUpdate,
    ChannelDelete,
    ChannelStartTyping,
    ChannelStopTyping,

    // Server events
    ServerUpdate,
    ServerDelete,
    ServerMemberJoin,
    ServerMemberLeave,
    ServerMemberUpdate,

    // User events
    UserUpdate,

    // Emoji events
    EmojiCreate,
    EmojiDelete,
}

impl GatewayEventType {
    pub const ALL: [Self; 24] = [
        Self::Authenticated,
        Self::Ready,
        Self::Pong,
        Self::Error,
        Self::Bulk,
        Self::Auth,
        Self::DeleteSession,
        Self::DeleteAllSessions,
        Self::Message,
        Self::MessageUpdate,
        Self::MessageDelete,
        Self::ChannelCreate,
        Self::ChannelUpdate,
        Self::ChannelDelete,
        Self::ChannelStartTyping,
        Self::ChannelStopTyping,
        Self::ServerUpdate,
        Self::ServerDelete,
        Self::ServerMemberJoin,
        Self::ServerMemberLeave,
        Self::ServerMemberUpdate,
        Self::UserUpdate,
        Self::EmojiCreate,
        Self::EmojiDelete,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authenticated => "Authenticated",
            Self::Ready => "Ready",
            Self::Pong => "Pong",
            Self::Error => "Error",
            Self::Bulk => "Bulk",
            Self::Auth => "Auth",
            Self::DeleteSession => "DeleteSession",
            Self::DeleteAllSessions => "DeleteAllSessions",
            Self::Message => "Message",
            Self::MessageUpdate => "MessageUpdate",
            Self::MessageDelete => "MessageDelete",
            Self::ChannelCreate => "ChannelCreate",
            Self::ChannelUpdate => "ChannelUpdate",
            Self::ChannelDelete => "ChannelDelete",
            Self::ChannelStartTyping => "ChannelStartTyping",
            Self::ChannelStopTyping => "ChannelStopTyping",
            Self::ServerUpdate => "ServerUpdate",
            Self::ServerDelete => "ServerDelete",
            Self::ServerMemberJoin => "ServerMemberJoin",
            Self::ServerMemberLeave => "ServerMemberLeave",
            Self::ServerMemberUpdate => "ServerMemberUpdate",
            Self::UserUpdate => "UserUpdate",
            Self::EmojiCreate => "EmojiCreate",
            Self::EmojiDelete => "EmojiDelete",
        }
    }

    /// Frames whose payload wraps other events
    #[must_use]
    pub const fn is_envelope(self) -> bool {
        matches!(self, Self::Bulk | Self::Auth)
    }

    /// Session lifecycle frames handled by the connection itself
    #[must_use]
    pub const fn is_connection_event(self) -> bool {
        matches!(
            self,
            Self::Authenticated | Self::Ready | Self::Pong | Self::Error
        )
    }
}

impl fmt::Display for GatewayEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown event type '{s}'"))
    }
}

/// A typed inbound event, decoded from frames whose `type` equals [`Self::TYPE`].
///
/// Implement this for payloads the built-in catalogue does not cover and
/// register them with `EventDispatcher::register`.
pub trait GatewayEvent: DeserializeOwned + Send + Sync + 'static {
    const TYPE: &'static str;
}
