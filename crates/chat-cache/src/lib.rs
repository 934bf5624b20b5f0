//! # chat-cache
//!
//! In-memory entity caching shared by the REST and gateway transports.
//!
//! ## Features
//!
//! - **Store**: Generic id-keyed map with hash or insertion-ordered backing
//! - **Shared State**: Typed stores for users, servers, channels, members and emojis
//!
//! ## Example
//!
//! ```ignore
//! use chat_cache::SharedState;
//!
//! let state = SharedState::new();
//! state.add_user(user)?;
//!
//! let cached = state.get_user("01H...")?;
//! state.delete_member(&server_id, &user_id)?;
//! ```

pub mod state;
pub mod store;

pub use state::SharedState;
pub use store::{Store, StoreBacking, StoreError, StoreResult};
