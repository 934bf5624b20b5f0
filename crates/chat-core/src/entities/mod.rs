//! Domain entities - value snapshots of protocol objects

mod channel;
mod emoji;
mod member;
mod message;
mod server;
mod user;

pub use channel::{Channel, ChannelType, PartialChannel};
pub use emoji::{Emoji, EmojiParent};
pub use member::{Member, PartialMember};
pub use message::{Message, PartialMessage, ReplyIntent, SendMessage};
pub use server::{PartialServer, Server};
pub use user::{BotInformation, PartialUser, Presence, User, UserStatus};
