//! Gateway error types

mod gateway_error;

pub use gateway_error::{BoxError, GatewayError, GatewayResult, HandlerError};
