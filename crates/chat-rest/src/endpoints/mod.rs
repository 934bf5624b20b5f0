//! Typed endpoint calls
//!
//! Each call is one line into the request pipeline.

mod channels;
mod servers;
mod users;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::RestClient;
use crate::error::RestResult;

/// Service metadata returned by the API root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Server version
    pub revolt: String,
    /// Gateway URL advertised by the node
    pub ws: String,
    #[serde(default)]
    pub app: String,
    #[serde(default)]
    pub features: serde_json::Value,
}

impl RestClient {
    /// Fetch node metadata (version and gateway URL)
    pub async fn query_node(&self) -> RestResult<NodeInfo> {
        self.request_json(Method::GET, "/", None).await
    }
}
