//! Integration test utilities for the chat client
//!
//! This crate provides a scripted in-process gateway, entity fixtures
//! and client configuration helpers for end-to-end tests.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
