//! Client configuration structs
//!
//! Loads configuration from environment variables (and `.env` when present).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::{Token, TokenKind};

/// Main client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub token: Token,
    pub api: ApiConfig,
    pub gateway: GatewayConfig,
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// REST request pipeline configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    /// Retries on 502 and 429 (the `sequence` bound)
    pub max_retries: u32,
    pub retry_on_rate_limit: bool,
    /// Transport-level retries for idempotent requests
    pub transport_retries: u32,
}

impl ApiConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            request_timeout_ms: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_on_rate_limit: true,
            transport_retries: default_transport_retries(),
        }
    }
}

/// Gateway frame encoding, selected per connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireEncoding {
    /// JSON text frames
    #[default]
    Json,
    /// MessagePack binary frames
    Binary,
}

impl WireEncoding {
    /// Value of the `encoding` query parameter
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Binary => "binary",
        }
    }
}

impl FromStr for WireEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "binary" | "msgpack" => Ok(Self::Binary),
            other => Err(format!("unknown encoding '{other}'")),
        }
    }
}

/// Gateway connection configuration. Zero durations mean "use the default".
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub url: String,
    pub api_version: u32,
    pub encoding: WireEncoding,
    pub heartbeat_interval_ms: u64,
    pub read_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub reconnect_max_elapsed_ms: u64,
}

impl GatewayConfig {
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        or_default(self.heartbeat_interval_ms, default_heartbeat_interval())
    }

    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        or_default(self.read_timeout_ms, default_read_timeout())
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        or_default(self.connect_timeout_ms, default_connect_timeout())
    }

    #[must_use]
    pub fn reconnect_max_elapsed(&self) -> Duration {
        or_default(self.reconnect_max_elapsed_ms, default_reconnect_max_elapsed())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_ws_url(),
            api_version: 1,
            encoding: WireEncoding::Json,
            heartbeat_interval_ms: default_heartbeat_interval(),
            read_timeout_ms: default_read_timeout(),
            connect_timeout_ms: default_connect_timeout(),
            reconnect_max_elapsed_ms: default_reconnect_max_elapsed(),
        }
    }
}

/// Entity kinds tracked by the shared cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Users,
    Servers,
    Channels,
    Members,
    Emojis,
}

impl FromStr for CacheKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "users" | "user" => Ok(Self::Users),
            "servers" | "server" => Ok(Self::Servers),
            "channels" | "channel" => Ok(Self::Channels),
            "members" | "member" => Ok(Self::Members),
            "emojis" | "emoji" => Ok(Self::Emojis),
            other => Err(format!("unknown cache kind '{other}'")),
        }
    }
}

/// Shared state cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Feed decoded gateway/REST entities into the cache
    pub enabled: bool,
    /// Use insertion-ordered stores
    pub ordered: bool,
    /// Kinds whose stores are constructed disabled
    pub disabled: Vec<CacheKind>,
}

impl CacheConfig {
    #[must_use]
    pub fn is_disabled(&self, kind: CacheKind) -> bool {
        self.disabled.contains(&kind)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ordered: false,
            disabled: Vec::new(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "chat-client".to_string()
}

fn default_api_url() -> String {
    "https://api.revolt.chat/".to_string()
}

fn default_ws_url() -> String {
    "wss://ws.revolt.chat".to_string()
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_transport_retries() -> u32 {
    2
}

fn default_heartbeat_interval() -> u64 {
    30_000
}

fn default_read_timeout() -> u64 {
    90_000
}

fn default_connect_timeout() -> u64 {
    15_000
}

fn default_reconnect_max_elapsed() -> u64 {
    300_000 // 5 minutes
}

fn or_default(ms: u64, default_ms: u64) -> Duration {
    Duration::from_millis(if ms == 0 { default_ms } else { ms })
}

impl ClientConfig {
    /// Build a configuration for `token` with every other setting defaulted
    pub fn new(token: Token) -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: Environment::default(),
            },
            token,
            api: ApiConfig::default(),
            gateway: GatewayConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `CHAT_TOKEN` is missing or a variable cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    /// Returns an error if `CHAT_TOKEN` is missing or a variable cannot be parsed
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let token_kind: TokenKind = vars.parse("CHAT_TOKEN_KIND")?.unwrap_or_default();
        let token = vars
            .get("CHAT_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingVar("CHAT_TOKEN"))?;

        Ok(Self {
            app: AppSettings {
                name: vars.get("APP_NAME").unwrap_or_else(default_app_name),
                env: vars.parse("APP_ENV")?.unwrap_or_default(),
            },
            token: Token::new(token, token_kind),
            api: ApiConfig {
                base_url: vars.get("CHAT_API_URL").unwrap_or_else(default_api_url),
                request_timeout_ms: vars
                    .parse("CHAT_API_TIMEOUT_MS")?
                    .unwrap_or_else(default_request_timeout),
                max_retries: vars
                    .parse("CHAT_API_MAX_RETRIES")?
                    .unwrap_or_else(default_max_retries),
                retry_on_rate_limit: vars.parse("CHAT_API_RETRY_ON_RATE_LIMIT")?.unwrap_or(true),
                transport_retries: vars
                    .parse("CHAT_API_TRANSPORT_RETRIES")?
                    .unwrap_or_else(default_transport_retries),
            },
            gateway: GatewayConfig {
                url: vars.get("CHAT_WS_URL").unwrap_or_else(default_ws_url),
                api_version: vars.parse("CHAT_WS_VERSION")?.unwrap_or(1),
                encoding: vars.parse("CHAT_WS_ENCODING")?.unwrap_or_default(),
                heartbeat_interval_ms: vars
                    .parse("CHAT_WS_HEARTBEAT_MS")?
                    .unwrap_or_else(default_heartbeat_interval),
                read_timeout_ms: vars
                    .parse("CHAT_WS_READ_TIMEOUT_MS")?
                    .unwrap_or_else(default_read_timeout),
                connect_timeout_ms: vars
                    .parse("CHAT_WS_CONNECT_TIMEOUT_MS")?
                    .unwrap_or_else(default_connect_timeout),
                reconnect_max_elapsed_ms: vars
                    .parse("CHAT_WS_RECONNECT_MAX_MS")?
                    .unwrap_or_else(default_reconnect_max_elapsed),
            },
            cache: CacheConfig {
                enabled: vars.parse("CHAT_CACHE_ENABLED")?.unwrap_or(true),
                ordered: vars.parse("CHAT_CACHE_ORDERED")?.unwrap_or(false),
                disabled: match vars.get("CHAT_CACHE_DISABLED") {
                    Some(list) => list
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(|s| {
                            s.parse()
                                .map_err(|e| ConfigError::InvalidValue("CHAT_CACHE_DISABLED", e))
                        })
                        .collect::<Result<_, _>>()?,
                    None => Vec::new(),
                },
            },
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }

    /// Unset is `Ok(None)`; set but unparsable is an error rather than a silent default
    fn parse<T>(&self, name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: ToString,
    {
        self.get(name)
            .map(|raw| {
                raw.trim()
                    .parse()
                    .map_err(|e: T::Err| ConfigError::InvalidValue(name, e.to_string()))
            })
            .transpose()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
