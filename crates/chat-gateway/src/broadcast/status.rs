//! Status topic
//!
//! A `tokio::sync::broadcast` channel that outlives individual connections:
//! it is created by the first `open()`, survives restarts, and is closed
//! after a terminal status so every subscriber observes the end.

use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Buffered statuses per subscriber
const STATUS_CAPACITY: usize = 16;

/// Lifecycle notification published to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusPayload {
    /// A connection reached `Open`
    Opened,
    /// The current connection ended and a new one is being opened
    EndOfSession,
    /// The gateway stopped for good; carries the reason when it was not a clean close
    Terminal(Option<String>),
}

impl StatusPayload {
    /// Whether worker tasks bound to the current connection should exit
    #[must_use]
    pub fn ends_session(&self) -> bool {
        matches!(self, Self::EndOfSession | Self::Terminal(_))
    }
}

#[derive(Debug, Default)]
pub struct StatusTopic {
    sender: Mutex<Option<broadcast::Sender<StatusPayload>>>,
}

impl StatusTopic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the channel unless one is already live
    pub fn ensure_open(&self) {
        let mut sender = self.sender.lock();
        if sender.is_none() {
            *sender = Some(broadcast::channel(STATUS_CAPACITY).0);
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// `None` when no connection has been opened or the topic has closed
    pub fn subscribe(&self) -> Option<broadcast::Receiver<StatusPayload>> {
        self.sender.lock().as_ref().map(broadcast::Sender::subscribe)
    }

    /// Publish to current subscribers; returns how many received it
    pub fn publish(&self, status: StatusPayload) -> usize {
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return 0;
        };
        let delivered = sender.send(status.clone()).unwrap_or(0);
        tracing::debug!(status = ?status, subscribers = delivered, "Status published");
        delivered
    }

    /// Publish a terminal status and drop the channel
    pub fn finish(&self, reason: Option<String>) {
        let mut sender = self.sender.lock();
        if let Some(tx) = sender.take() {
            let delivered = tx.send(StatusPayload::Terminal(reason.clone())).unwrap_or(0);
            tracing::debug!(reason = ?reason, subscribers = delivered, "Status topic closed");
        }
    }
}
