//! Connection status broadcasting
//!
//! Fan-out of lifecycle notifications to `wait()` callers and worker tasks.

mod status;

pub use status::{StatusPayload, StatusTopic};
