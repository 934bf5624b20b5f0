//! Connection management
//!
//! One gateway connection at a time, driven by a control queue.

mod classify;
mod manager;
mod session;
mod state;

pub use manager::Gateway;
pub use state::{ControlMessage, WsState};
