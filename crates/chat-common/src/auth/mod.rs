//! Authentication utilities

mod token;

pub use token::{Token, TokenKind};
