//! # chat-client
//!
//! One handle over the chat runtime: a shared entity cache, the
//! rate-limited REST pipeline and the gateway event stream.
//!
//! ## Example
//!
//! ```ignore
//! use chat_client::Client;
//! use chat_gateway::events::MessageEvent;
//!
//! let client = Client::from_env()?;
//! client.on::<MessageEvent, _>(|_, event| {
//!     tracing::info!(content = %event.0.content, "Message");
//!     Ok(())
//! });
//! client.open().await?;
//! client.wait().await;
//! ```

pub mod client;
pub mod error;

pub use client::{Client, ClientBuilder};
pub use error::{ClientError, ClientResult};
