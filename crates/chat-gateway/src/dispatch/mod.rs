//! Event dispatch table
//!
//! Maps discriminators to decode-and-invoke routes built at startup.

mod context;
mod dispatcher;

pub use context::Context;
pub use dispatcher::{ErrorCallback, EventDispatcher, RawSink, Registration};
