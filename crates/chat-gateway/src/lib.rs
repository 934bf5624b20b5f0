//! # chat-gateway
//!
//! Client side of the real-time event stream: connection lifecycle,
//! heartbeat, reconnects and the event dispatch table.
//!
//! ## Features
//!
//! - **Gateway**: Single-session connection manager driven by a control queue
//! - **Heartbeat**: Ping after authentication, read deadline refreshed by pongs
//! - **Reconnect**: Exponential backoff after transient failures
//! - **Event Dispatch**: Typed handlers keyed by event discriminator, batch and auth envelopes
//!
//! ## Example
//!
//! ```ignore
//! use chat_gateway::{events::MessageEvent, EventDispatcher, Gateway};
//!
//! let dispatcher = Arc::new(EventDispatcher::new().with_cache(state));
//! dispatcher.on::<MessageEvent, _>(|_, MessageEvent(message)| {
//!     println!("{}", message.content);
//!     Ok(())
//! });
//!
//! let gateway = Gateway::new(config.gateway.clone(), config.token.clone(), dispatcher);
//! gateway.open().await?;
//! gateway.wait().await;
//! ```

pub mod broadcast;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod protocol;

pub use broadcast::StatusPayload;
pub use connection::{ControlMessage, Gateway, WsState};
pub use dispatch::{Context, EventDispatcher, Registration};
pub use error::{BoxError, GatewayError, GatewayResult, HandlerError};
pub use events::{GatewayEvent, GatewayEventType};
pub use protocol::{ClientFrame, Frame};
