//! Write-through of REST results into the shared state

use chat_cache::{SharedState, StoreResult};
use chat_core::{Emoji, User};

/// Entity types the pipeline copies into [`SharedState`] after a successful decode
pub trait CacheWrite: Clone + Send + 'static {
    fn write_to(self, state: &SharedState) -> StoreResult<()>;
}

impl CacheWrite for User {
    fn write_to(self, state: &SharedState) -> StoreResult<()> {
        state.add_user(self)
    }
}

impl CacheWrite for Emoji {
    fn write_to(self, state: &SharedState) -> StoreResult<()> {
        state.add_emoji(self)
    }
}
