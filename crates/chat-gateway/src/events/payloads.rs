//! Event payload definitions
//!
//! Each payload decodes from the whole frame; the `type` field is ignored.

use chat_core::{
    Channel, Emoji, Member, MemberId, Message, PartialChannel, PartialMember, PartialMessage,
    PartialServer, PartialUser, Server, User,
};
use serde::{Deserialize, Serialize};

use super::{GatewayEvent, GatewayEventType};

// === Connection Events ===

/// Sent once the token has been accepted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedEvent {}

/// Full state snapshot sent after authentication
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyEvent {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub emojis: Vec<Emoji>,
}

impl ReadyEvent {
    /// Total number of entities in the snapshot
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
            + self.servers.len()
            + self.channels.len()
            + self.members.len()
            + self.emojis.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Heartbeat reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PongEvent {
    #[serde(default)]
    pub data: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub error: String,
}

// === Session Events ===

/// A single session of `user_id` was revoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSessionEvent {
    pub user_id: String,
    pub session_id: String,
}

/// Every session of `user_id` except `exclude_session_id` was revoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAllSessionsEvent {
    pub user_id: String,
    #[serde(default)]
    pub exclude_session_id: Option<String>,
}

// === Message Events ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageEvent(pub Message);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageUpdateEvent {
    pub id: String,
    pub channel: String,
    pub data: PartialMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDeleteEvent {
    pub id: String,
    pub channel: String,
}

// === Channel Events ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelCreateEvent(pub Channel);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelUpdateEvent {
    pub id: String,
    pub data: PartialChannel,
    /// Fields removed from the channel
    #[serde(default)]
    pub clear: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDeleteEvent {
    pub id: String,
}

/// `user` started typing in channel `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStartTypingEvent {
    pub id: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStopTypingEvent {
    pub id: String,
    pub user: String,
}

// === Server Events ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerUpdateEvent {
    pub id: String,
    pub data: PartialServer,
    #[serde(default)]
    pub clear: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDeleteEvent {
    pub id: String,
}

/// `user` joined server `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMemberJoinEvent {
    pub id: String,
    pub user: String,
}

/// `user` left server `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMemberLeaveEvent {
    pub id: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMemberUpdateEvent {
    pub id: MemberId,
    pub data: PartialMember,
    #[serde(default)]
    pub clear: Vec<String>,
}

// === User Events ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdateEvent {
    pub id: String,
    pub data: PartialUser,
    #[serde(default)]
    pub clear: Vec<String>,
}

// === Emoji Events ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmojiCreateEvent(pub Emoji);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiDeleteEvent {
    pub id: String,
}

macro_rules! gateway_events {
    ($($payload:ty => $kind:ident),* $(,)?) => {
        $(
            impl GatewayEvent for $payload {
                const TYPE: &'static str = GatewayEventType::$kind.as_str();
            }
        )*
    };
}

gateway_events! {
    AuthenticatedEvent => Authenticated,
    ReadyEvent => Ready,
    PongEvent => Pong,
    ErrorEvent => Error,
    DeleteSessionEvent => DeleteSession,
    DeleteAllSessionsEvent => DeleteAllSessions,
    MessageEvent => Message,
    MessageUpdateEvent => MessageUpdate,
    MessageDeleteEvent => MessageDelete,
    ChannelCreateEvent => ChannelCreate,
    ChannelUpdateEvent => ChannelUpdate,
    ChannelDeleteEvent => ChannelDelete,
    ChannelStartTypingEvent => ChannelStartTyping,
    ChannelStopTypingEvent => ChannelStopTyping,
    ServerUpdateEvent => ServerUpdate,
    ServerDeleteEvent => ServerDelete,
    ServerMemberJoinEvent => ServerMemberJoin,
    ServerMemberLeaveEvent => ServerMemberLeave,
    ServerMemberUpdateEvent => ServerMemberUpdate,
    UserUpdateEvent => UserUpdate,
    EmojiCreateEvent => EmojiCreate,
    EmojiDeleteEvent => EmojiDelete,
}
