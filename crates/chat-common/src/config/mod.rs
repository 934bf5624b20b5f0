//! Configuration structs

mod client_config;

pub use client_config::{
    ApiConfig, AppSettings, CacheConfig, CacheKind, ClientConfig, ConfigError, Environment,
    GatewayConfig, WireEncoding,
};
