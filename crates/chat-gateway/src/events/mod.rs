//! Gateway events
//!
//! Discriminators and typed payloads for every inbound event the client understands.

mod event_types;
mod payloads;

pub use event_types::{GatewayEvent, GatewayEventType};
pub use payloads::{
    AuthenticatedEvent, ChannelCreateEvent, ChannelDeleteEvent, ChannelStartTypingEvent,
    ChannelStopTypingEvent, ChannelUpdateEvent, DeleteAllSessionsEvent, DeleteSessionEvent,
    EmojiCreateEvent, EmojiDeleteEvent, ErrorEvent, MessageDeleteEvent, MessageEvent,
    MessageUpdateEvent, PongEvent, ReadyEvent, ServerDeleteEvent, ServerMemberJoinEvent,
    ServerMemberLeaveEvent, ServerMemberUpdateEvent, ServerUpdateEvent, UserUpdateEvent,
};
