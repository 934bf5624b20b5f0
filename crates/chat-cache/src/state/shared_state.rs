//! Shared state - one typed store per entity kind.
//!
//! Methods are pass-throughs to the underlying [`Store`]. Nothing here is
//! transactional across stores; adding a server and then its channels is two
//! independent writes.

use chat_common::{CacheConfig, CacheKind};
use chat_core::{
    member_key, Channel, Emoji, Member, PartialChannel, PartialMember, PartialServer,
    PartialUser, Server, User,
};

use crate::store::{Store, StoreBacking, StoreResult};

/// Entity caches consulted by both transports
#[derive(Debug, Default)]
pub struct SharedState {
    users: Store<User>,
    servers: Store<Server>,
    channels: Store<Channel>,
    members: Store<Member>,
    emojis: Store<Emoji>,
}

impl SharedState {
    /// All stores enabled, unordered
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build stores according to the cache configuration
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        let backing = if config.ordered {
            StoreBacking::Ordered
        } else {
            StoreBacking::Unordered
        };

        fn store<T>(config: &CacheConfig, kind: CacheKind, backing: StoreBacking) -> Store<T> {
            if config.is_disabled(kind) {
                tracing::debug!(kind = ?kind, "Cache store disabled");
                Store::disabled(backing)
            } else {
                Store::new(backing)
            }
        }

        Self {
            users: store(config, CacheKind::Users, backing),
            servers: store(config, CacheKind::Servers, backing),
            channels: store(config, CacheKind::Channels, backing),
            members: store(config, CacheKind::Members, backing),
            emojis: store(config, CacheKind::Emojis, backing),
        }
    }

    // =========================================================================
    // Store access
    // =========================================================================

    #[inline]
    pub fn users(&self) -> &Store<User> {
        &self.users
    }

    #[inline]
    pub fn servers(&self) -> &Store<Server> {
        &self.servers
    }

    #[inline]
    pub fn channels(&self) -> &Store<Channel> {
        &self.channels
    }

    #[inline]
    pub fn members(&self) -> &Store<Member> {
        &self.members
    }

    #[inline]
    pub fn emojis(&self) -> &Store<Emoji> {
        &self.emojis
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn get_user(&self, id: &str) -> StoreResult<User> {
        self.users.get(id)
    }

    pub fn add_user(&self, user: User) -> StoreResult<()> {
        self.users.set(user.id.clone(), user)
    }

    pub fn delete_user(&self, id: &str) -> StoreResult<()> {
        self.users.delete(id)
    }

    pub fn patch_user(&self, id: &str, patch: &PartialUser) -> StoreResult<()> {
        self.users.modify(id, |user| patch.apply_to(user))
    }

    // =========================================================================
    // Servers
    // =========================================================================

    pub fn get_server(&self, id: &str) -> StoreResult<Server> {
        self.servers.get(id)
    }

    pub fn add_server(&self, server: Server) -> StoreResult<()> {
        self.servers.set(server.id.clone(), server)
    }

    pub fn delete_server(&self, id: &str) -> StoreResult<()> {
        self.servers.delete(id)
    }

    pub fn patch_server(&self, id: &str, patch: &PartialServer) -> StoreResult<()> {
        self.servers.modify(id, |server| patch.apply_to(server))
    }

    // =========================================================================
    // Channels
    // =========================================================================

    pub fn get_channel(&self, id: &str) -> StoreResult<Channel> {
        self.channels.get(id)
    }

    pub fn add_channel(&self, channel: Channel) -> StoreResult<()> {
        self.channels.set(channel.id.clone(), channel)
    }

    pub fn delete_channel(&self, id: &str) -> StoreResult<()> {
        self.channels.delete(id)
    }

    pub fn patch_channel(&self, id: &str, patch: &PartialChannel) -> StoreResult<()> {
        self.channels.modify(id, |channel| patch.apply_to(channel))
    }

    // =========================================================================
    // Members (keyed by server id + user id)
    // =========================================================================

    pub fn get_member(&self, server_id: &str, user_id: &str) -> StoreResult<Member> {
        self.members.get(&composite(server_id, user_id))
    }

    pub fn add_member(&self, member: Member) -> StoreResult<()> {
        let key = composite(&member.id.server, &member.id.user);
        self.members.set(key, member)
    }

    pub fn delete_member(&self, server_id: &str, user_id: &str) -> StoreResult<()> {
        self.members.delete(&composite(server_id, user_id))
    }

    pub fn patch_member(
        &self,
        server_id: &str,
        user_id: &str,
        patch: &PartialMember,
    ) -> StoreResult<()> {
        self.members
            .modify(&composite(server_id, user_id), |member| patch.apply_to(member))
    }

    // =========================================================================
    // Emojis
    // =========================================================================

    pub fn get_emoji(&self, id: &str) -> StoreResult<Emoji> {
        self.emojis.get(id)
    }

    pub fn add_emoji(&self, emoji: Emoji) -> StoreResult<()> {
        self.emojis.set(emoji.id.clone(), emoji)
    }

    pub fn delete_emoji(&self, id: &str) -> StoreResult<()> {
        self.emojis.delete(id)
    }
}

/// Member key, or `""` when either half is missing so the store rejects it as invalid
fn composite(server_id: &str, user_id: &str) -> String {
    if server_id.is_empty() || user_id.is_empty() {
        String::new()
    } else {
        member_key(server_id, user_id)
    }
}
