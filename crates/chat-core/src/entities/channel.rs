//! Channel entity - represents a server channel, DM, or group

use serde::{Deserialize, Serialize};

/// Channel type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ChannelType {
    /// Personal notes channel
    SavedMessages,
    /// Direct message between two users
    DirectMessage,
    /// Group DM
    Group,
    /// Server text channel
    #[default]
    TextChannel,
    /// Server voice channel
    VoiceChannel,
}

impl ChannelType {
    /// Whether channels of this type belong to a server
    #[inline]
    #[must_use]
    pub fn is_server_channel(self) -> bool {
        matches!(self, Self::TextChannel | Self::VoiceChannel)
    }
}

/// Channel entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(rename = "_id")]
    pub id: String,
    pub channel_type: ChannelType,
    /// Owning server, for server channels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Participants, for DMs and groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
}

impl Channel {
    /// Create a new server text channel
    #[must_use]
    pub fn new_text(id: impl Into<String>, server: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            channel_type: ChannelType::TextChannel,
            server: Some(server.into()),
            name: Some(name.into()),
            description: None,
            recipients: Vec::new(),
            last_message_id: None,
            nsfw: false,
        }
    }

    /// Create a new DM channel between two users
    #[must_use]
    pub fn new_dm(id: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            channel_type: ChannelType::DirectMessage,
            server: None,
            name: None,
            description: None,
            recipients: vec![a.into(), b.into()],
            last_message_id: None,
            nsfw: false,
        }
    }

    /// Check if this is a DM or group
    #[inline]
    pub fn is_private(&self) -> bool {
        matches!(
            self.channel_type,
            ChannelType::DirectMessage | ChannelType::Group | ChannelType::SavedMessages
        )
    }
}

/// Partial channel carried by `ChannelUpdate`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialChannel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<bool>,
}

impl PartialChannel {
    /// Overlay the present fields onto `channel`
    pub fn apply_to(&self, channel: &mut Channel) {
        if let Some(name) = &self.name {
            channel.name = Some(name.clone());
        }
        if let Some(description) = &self.description {
            channel.description = Some(description.clone());
        }
        if let Some(recipients) = &self.recipients {
            channel.recipients.clone_from(recipients);
        }
        if let Some(last) = &self.last_message_id {
            channel.last_message_id = Some(last.clone());
        }
        if let Some(nsfw) = self.nsfw {
            channel.nsfw = nsfw;
        }
    }
}
