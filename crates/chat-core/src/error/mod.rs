//! Error types shared across the client crates

mod api_error;

pub use api_error::ApiError;
