//! Channel and message endpoints

use chat_core::{Channel, Message, SendMessage};
use reqwest::Method;

use crate::client::{json_body, RestClient};
use crate::error::RestResult;

impl RestClient {
    pub async fn fetch_channel(&self, channel_id: &str) -> RestResult<Channel> {
        self.request_json(Method::GET, &format!("/channels/{channel_id}"), None)
            .await
    }

    /// Send a message; a random nonce is attached when none is given
    pub async fn send_message(
        &self,
        channel_id: &str,
        mut message: SendMessage,
    ) -> RestResult<Message> {
        if message.nonce.is_none() {
            message.nonce = Some(uuid::Uuid::new_v4().to_string());
        }
        let body = json_body(&message)?;

        self.request_json(
            Method::POST,
            &format!("/channels/{channel_id}/messages"),
            Some(body),
        )
        .await
    }

    pub async fn delete_message(&self, channel_id: &str, message_id: &str) -> RestResult<()> {
        self.request_empty(
            Method::DELETE,
            &format!("/channels/{channel_id}/messages/{message_id}"),
            None,
        )
        .await
    }
}
