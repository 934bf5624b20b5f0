//! Test fixtures and data generators
//!
//! Entities are built with the chat-core constructors and serialized the
//! way the service sends them.

use chat_core::{Channel, Emoji, EmojiParent, Member, Server, User};
use serde_json::{json, Value};

pub const SERVER_ID: &str = "01SERVER";
pub const CHANNEL_ID: &str = "01CHANNEL";
pub const USER_ID: &str = "01USER";
pub const EMOJI_ID: &str = "01EMOJI";

pub fn user() -> User {
    User::new(USER_ID, "alice")
}

pub fn server() -> Server {
    let mut server = Server::new(SERVER_ID, "Test Server", USER_ID);
    server.channels.push(CHANNEL_ID.to_string());
    server
}

pub fn channel() -> Channel {
    Channel::new_text(CHANNEL_ID, SERVER_ID, "general")
}

pub fn member() -> Member {
    Member::new(SERVER_ID, USER_ID)
}

pub fn emoji() -> Emoji {
    Emoji {
        id: EMOJI_ID.to_string(),
        parent: EmojiParent::Server {
            id: SERVER_ID.to_string(),
        },
        creator_id: USER_ID.to_string(),
        name: "wave".to_string(),
        animated: false,
        nsfw: false,
    }
}

/// Serialize a fixture into a JSON value
pub fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// `Ready` snapshot holding one of every fixture
pub fn ready_frame() -> Value {
    json!({
        "type": "Ready",
        "users": [to_json(&user())],
        "servers": [to_json(&server())],
        "channels": [to_json(&channel())],
        "members": [to_json(&member())],
        "emojis": [to_json(&emoji())],
    })
}

pub fn typing_frame(channel: &str, user: &str) -> Value {
    json!({ "type": "ChannelStartTyping", "id": channel, "user": user })
}

pub fn bulk_frame(items: Vec<Value>) -> Value {
    json!({ "type": "Bulk", "v": items })
}

/// `Error` body in the API's tagged shape
pub fn api_error(kind: &str) -> Value {
    json!({ "type": kind })
}
