//! Builder for wiring a client with custom parts

use std::sync::Arc;

use chat_cache::SharedState;
use chat_common::ClientConfig;
use chat_gateway::{EventDispatcher, Gateway};
use chat_rest::{CustomRateLimit, GlobalCooldown, RateLimiter, RestClient, RetryPolicy};

use super::Client;
use crate::error::{ClientError, ClientResult};

/// Builder for [`Client`].
///
/// Only the configuration is required; every other part defaults to a
/// fresh instance derived from it.
pub struct ClientBuilder {
    config: Option<ClientConfig>,
    state: Option<Arc<SharedState>>,
    limiter: Option<Arc<RateLimiter>>,
    custom_limits: Vec<CustomRateLimit>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
    dispatcher: Option<EventDispatcher>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            state: None,
            limiter: None,
            custom_limits: Vec::new(),
            retry_policy: None,
            dispatcher: None,
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share a cache with other clients
    pub fn state(mut self, state: Arc<SharedState>) -> Self {
        self.state = Some(state);
        self
    }

    /// Share a rate limiter (and its global cooldown) with other clients
    pub fn limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Fixed-window rule applied to buckets whose key ends with the rule's suffix.
    ///
    /// Ignored when a shared limiter is supplied.
    pub fn custom_limit(mut self, rule: CustomRateLimit) -> Self {
        self.custom_limits.push(rule);
        self
    }

    pub fn retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry_policy = Some(Arc::new(policy));
        self
    }

    /// Start from a dispatcher with handlers already registered
    pub fn dispatcher(mut self, dispatcher: EventDispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn build(self) -> ClientResult<Client> {
        let config = self.config.ok_or(ClientError::Missing("config"))?;
        let caching = config.cache.enabled;

        let state = self
            .state
            .unwrap_or_else(|| Arc::new(SharedState::from_config(&config.cache)));

        if self.limiter.is_some() && !self.custom_limits.is_empty() {
            tracing::warn!("Custom rate limits ignored for a shared limiter");
        }
        let limiter = self.limiter.unwrap_or_else(|| {
            Arc::new(RateLimiter::new(GlobalCooldown::new()).with_custom_limits(self.custom_limits))
        });

        let mut rest = RestClient::new(&config.api, config.token.clone())?.with_limiter(limiter);
        if let Some(policy) = self.retry_policy {
            rest = rest.with_shared_retry_policy(policy);
        }
        if caching {
            rest = rest.with_state(Arc::clone(&state));
        }

        let mut dispatcher = self.dispatcher.unwrap_or_default();
        if caching {
            dispatcher = dispatcher.with_cache(Arc::clone(&state));
        }
        let gateway = Gateway::new(
            config.gateway.clone(),
            config.token.clone(),
            Arc::new(dispatcher),
        );

        tracing::debug!(
            app = %config.app.name,
            api = %config.api.base_url,
            gateway = %config.gateway.url,
            caching,
            "Client built"
        );

        Ok(Client::from_parts(config, state, rest, gateway))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
