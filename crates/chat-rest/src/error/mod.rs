//! REST error types

mod rest_error;

pub use rest_error::{RateLimitError, RestError, RestResult};
