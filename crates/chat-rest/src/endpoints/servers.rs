//! Server and member endpoints

use chat_core::{Member, Server};
use reqwest::Method;

use crate::client::RestClient;
use crate::error::RestResult;

impl RestClient {
    pub async fn fetch_server(&self, server_id: &str) -> RestResult<Server> {
        self.request_json(Method::GET, &format!("/servers/{server_id}"), None)
            .await
    }

    pub async fn fetch_member(&self, server_id: &str, user_id: &str) -> RestResult<Member> {
        self.request_json(
            Method::GET,
            &format!("/servers/{server_id}/members/{user_id}"),
            None,
        )
        .await
    }
}
