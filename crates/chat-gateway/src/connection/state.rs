//! Connection state and control messages

use std::fmt;

use crate::protocol::Frame;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WsState {
    #[default]
    Closed,
    /// Dialing the gateway
    Opening,
    Open,
    /// Shutting down after a kill or fatal error
    Closing,
    /// Between a dropped connection and the next open
    Restarting,
}

impl WsState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Restarting => "restarting",
        }
    }

    /// States in which `open()` is rejected
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Open | Self::Opening)
    }
}

impl fmt::Display for WsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages consumed by the control-queue processor.
///
/// The processor is the only place connection state transitions happen.
#[derive(Debug, Clone)]
pub enum ControlMessage {
    /// Close for good
    Kill,
    /// Close and reopen
    Restart,
    /// Recoverable failure; triggers a restart
    Error(String),
    /// Unrecoverable failure; closes without reopening
    Fatal(String),
    /// Send the authentication frame
    Authenticate,
    /// Inbound frame to dispatch
    Event(Frame),
}

impl ControlMessage {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Kill => "kill",
            Self::Restart => "restart",
            Self::Error(_) => "error",
            Self::Fatal(_) => "fatal",
            Self::Authenticate => "authenticate",
            Self::Event(_) => "event",
        }
    }
}
