//! Emoji entity - custom emoji owned by a server or detached

use serde::{Deserialize, Serialize};

/// Where an emoji lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EmojiParent {
    Server { id: String },
    /// Parent server was deleted
    Detached,
}

/// Custom emoji entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    #[serde(rename = "_id")]
    pub id: String,
    pub parent: EmojiParent,
    pub creator_id: String,
    pub name: String,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub nsfw: bool,
}

impl Emoji {
    /// Id of the owning server, if still attached
    pub fn server_id(&self) -> Option<&str> {
        match &self.parent {
            EmojiParent::Server { id } => Some(id),
            EmojiParent::Detached => None,
        }
    }
}
