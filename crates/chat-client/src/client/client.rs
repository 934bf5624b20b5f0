//! Client handle
//!
//! Owns the shared state and hands it to both transports, so REST results
//! and gateway snapshots land in the same cache.

use std::sync::Arc;

use chat_cache::SharedState;
use chat_common::ClientConfig;
use chat_gateway::{
    BoxError, Context, EventDispatcher, Gateway, GatewayEvent, Registration, StatusPayload,
    WsState,
};
use chat_rest::RestClient;
use tokio::sync::broadcast;

use super::ClientBuilder;
use crate::error::ClientResult;

/// Chat client. Cheap to clone; clones share every part.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    state: Arc<SharedState>,
    rest: RestClient,
    gateway: Gateway,
}

impl Client {
    /// Client with default parts derived from `config`
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        ClientBuilder::new().config(config).build()
    }

    /// Client configured from the environment (and `.env`)
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_parts(
        config: ClientConfig,
        state: Arc<SharedState>,
        rest: RestClient,
        gateway: Gateway,
    ) -> Self {
        Self {
            config: Arc::new(config),
            state,
            rest,
            gateway,
        }
    }

    // === Accessors ===

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        self.gateway.dispatcher()
    }

    // === Events ===

    /// Register a handler for gateway events of type `E`
    pub fn on<E, F>(&self, handler: F) -> Registration
    where
        E: GatewayEvent,
        F: Fn(&Context, &E) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.dispatcher().on::<E, F>(handler)
    }

    // === Lifecycle ===

    pub async fn open(&self) -> ClientResult<()> {
        self.gateway.open().await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.gateway.close().await;
    }

    pub fn restart(&self) -> ClientResult<()> {
        self.gateway.restart()?;
        Ok(())
    }

    /// Park until the gateway stops for good
    pub async fn wait(&self) -> Option<String> {
        self.gateway.wait().await
    }

    pub fn connection_state(&self) -> WsState {
        self.gateway.state()
    }

    pub fn subscribe(&self) -> Option<broadcast::Receiver<StatusPayload>> {
        self.gateway.subscribe()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("app", &self.config.app.name)
            .field("rest", &self.rest)
            .field("gateway", &self.gateway)
            .finish()
    }
}
