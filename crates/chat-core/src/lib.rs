//! # chat-core
//!
//! Domain layer containing entity snapshots, partial-update overlays, value objects,
//! and the upstream error shape.
//! This crate has zero dependencies on transport (HTTP, WebSocket, etc.).

pub mod entities;
pub mod error;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    BotInformation, Channel, ChannelType, Emoji, EmojiParent, Member, Message, PartialChannel,
    PartialMember, PartialMessage, PartialServer, PartialUser, Presence, ReplyIntent,
    SendMessage, Server, User, UserStatus,
};
pub use error::ApiError;
pub use value_objects::{member_key, MemberId, MEMBER_KEY_SEPARATOR};
