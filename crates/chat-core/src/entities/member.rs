//! Member entity - represents a user's membership in a server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{timestamp, MemberId};

/// Server member entity (junction between User and Server)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "_id")]
    pub id: MemberId,
    #[serde(with = "timestamp")]
    pub joined_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub timeout: Option<DateTime<Utc>>,
}

impl Member {
    /// Create a new Member
    pub fn new(server: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            id: MemberId::new(server, user),
            joined_at: Utc::now(),
            nickname: None,
            avatar: None,
            roles: Vec::new(),
            timeout: None,
        }
    }

    /// Get display name (nickname if set, otherwise fallback)
    pub fn display_name<'a>(&'a self, username: &'a str) -> &'a str {
        self.nickname.as_deref().unwrap_or(username)
    }

    /// Check if member has a specific role
    #[inline]
    pub fn has_role(&self, role_id: &str) -> bool {
        self.roles.iter().any(|r| r == role_id)
    }

    /// Whether the member is timed out at `now`
    pub fn is_timed_out(&self, now: DateTime<Utc>) -> bool {
        self.timeout.is_some_and(|until| until > now)
    }
}

/// Partial member carried by `ServerMemberUpdate`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialMember {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub timeout: Option<DateTime<Utc>>,
}

impl PartialMember {
    /// Overlay the present fields onto `member`
    pub fn apply_to(&self, member: &mut Member) {
        if let Some(nickname) = &self.nickname {
            member.nickname = Some(nickname.clone());
        }
        if let Some(avatar) = &self.avatar {
            member.avatar = Some(avatar.clone());
        }
        if let Some(roles) = &self.roles {
            member.roles.clone_from(roles);
        }
        if let Some(timeout) = self.timeout {
            member.timeout = Some(timeout);
        }
    }
}
