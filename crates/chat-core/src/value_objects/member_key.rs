//! Member identity - the composite (server, user) key

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the server id and the user id in a member cache key
pub const MEMBER_KEY_SEPARATOR: &str = "/";

/// Compose the cache key for a member: `server_id + "/" + user_id`
#[must_use]
pub fn member_key(server_id: &str, user_id: &str) -> String {
    let mut key = String::with_capacity(server_id.len() + user_id.len() + 1);
    key.push_str(server_id);
    key.push_str(MEMBER_KEY_SEPARATOR);
    key.push_str(user_id);
    key
}

/// Composite id of a server member
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId {
    pub server: String,
    pub user: String,
}

impl MemberId {
    #[must_use]
    pub fn new(server: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            user: user.into(),
        }
    }

    /// Cache key for this member
    #[must_use]
    pub fn key(&self) -> String {
        member_key(&self.server, &self.user)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.server, MEMBER_KEY_SEPARATOR, self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_key() {
        assert_eq!(member_key("srv", "usr"), "srv/usr");
    }

    #[test]
    fn test_member_id_key_matches_display() {
        let id = MemberId::new("01H", "01U");
        assert_eq!(id.key(), "01H/01U");
        assert_eq!(id.to_string(), id.key());
    }

    #[test]
    fn test_member_id_json() {
        let id: MemberId = serde_json::from_str(r#"{"server":"a","user":"b"}"#).unwrap();
        assert_eq!(id, MemberId::new("a", "b"));
    }
}
