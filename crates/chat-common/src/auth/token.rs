//! Auth token with redacted Debug output

use std::fmt;
use std::str::FromStr;

/// Kind of credential presented to the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenKind {
    /// Bot account token
    #[default]
    Bot,
    /// User session token
    Session,
}

impl TokenKind {
    /// Header carrying this kind of token on REST calls
    #[must_use]
    pub fn header_name(self) -> &'static str {
        match self {
            Self::Bot => "x-bot-token",
            Self::Session => "x-session-token",
        }
    }
}

impl FromStr for TokenKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bot" => Ok(Self::Bot),
            "session" | "user" => Ok(Self::Session),
            other => Err(format!("unknown token kind '{other}'")),
        }
    }
}

/// Credential used for both the REST `x-*-token` header and the gateway
/// `Authenticate` frame. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    kind: TokenKind,
}

impl Token {
    pub fn new(value: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    pub fn bot(value: impl Into<String>) -> Self {
        Self::new(value, TokenKind::Bot)
    }

    pub fn session(value: impl Into<String>) -> Self {
        Self::new(value, TokenKind::Session)
    }

    /// Raw token value. Only call this when putting the token on the wire.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    #[inline]
    pub fn header_name(&self) -> &'static str {
        self.kind.header_name()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, [REDACTED])", self.kind)
    }
}
