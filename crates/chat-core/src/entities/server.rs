//! Server entity - a community with channels, roles and members

use serde::{Deserialize, Serialize};

/// Server entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ids of the channels in this server
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
}

impl Server {
    /// Create a new Server
    pub fn new(id: impl Into<String>, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            name: name.into(),
            description: None,
            channels: Vec::new(),
            icon: None,
            banner: None,
            nsfw: false,
        }
    }

    /// Check if a user is the server owner
    #[inline]
    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner == user_id
    }

    /// Check if the server lists a channel
    #[inline]
    pub fn has_channel(&self, channel_id: &str) -> bool {
        self.channels.iter().any(|c| c == channel_id)
    }
}

/// Partial server carried by `ServerUpdate`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialServer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<bool>,
}

impl PartialServer {
    /// Overlay the present fields onto `server`
    pub fn apply_to(&self, server: &mut Server) {
        if let Some(owner) = &self.owner {
            server.owner.clone_from(owner);
        }
        if let Some(name) = &self.name {
            server.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            server.description = Some(description.clone());
        }
        if let Some(channels) = &self.channels {
            server.channels.clone_from(channels);
        }
        if let Some(icon) = &self.icon {
            server.icon = Some(icon.clone());
        }
        if let Some(banner) = &self.banner {
            server.banner = Some(banner.clone());
        }
        if let Some(nsfw) = self.nsfw {
            server.nsfw = nsfw;
        }
    }
}
