//! User and emoji endpoints

use chat_core::{Emoji, User};
use reqwest::Method;

use crate::client::RestClient;
use crate::error::RestResult;

impl RestClient {
    /// Fetch the authenticated account
    pub async fn fetch_self(&self) -> RestResult<User> {
        self.request_cached(Method::GET, "/users/@me", None).await
    }

    pub async fn fetch_user(&self, user_id: &str) -> RestResult<User> {
        self.request_cached(Method::GET, &format!("/users/{user_id}"), None)
            .await
    }

    pub async fn fetch_emoji(&self, emoji_id: &str) -> RestResult<Emoji> {
        self.request_cached(Method::GET, &format!("/custom/emoji/{emoji_id}"), None)
            .await
    }
}
