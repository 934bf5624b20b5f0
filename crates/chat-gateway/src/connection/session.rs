//! A single live connection
//!
//! Owns the write half of the socket and a weak sender into the connection's
//! control queue. Workers hold the session they were started for, so a
//! stale worker can never post into a newer connection's queue. The manager
//! keeps the only strong sender; dropping it drains the queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chat_common::WireEncoding;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::ControlMessage;
use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{encode, ClientFrame};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsWriter = SplitSink<WsStream, Message>;
pub(crate) type WsReader = SplitStream<WsStream>;

pub(crate) struct Session {
    id: u64,
    encoding: WireEncoding,
    writer: Mutex<WsWriter>,
    control: mpsc::WeakUnboundedSender<ControlMessage>,
    heartbeat_started: AtomicBool,
}

impl Session {
    pub(crate) fn new(
        id: u64,
        encoding: WireEncoding,
        writer: WsWriter,
        control: &mpsc::UnboundedSender<ControlMessage>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            encoding,
            writer: Mutex::new(writer),
            control: control.downgrade(),
            heartbeat_started: AtomicBool::new(false),
        })
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Post to this connection's control queue; false once the queue is gone
    pub(crate) fn post(&self, message: ControlMessage) -> bool {
        let kind = message.kind();
        let posted = self
            .control
            .upgrade()
            .is_some_and(|control| control.send(message).is_ok());
        if !posted {
            tracing::trace!(session = self.id, kind, "Control queue closed, message dropped");
        }
        posted
    }

    /// True exactly once per connection
    pub(crate) fn claim_heartbeat(&self) -> bool {
        !self.heartbeat_started.swap(true, Ordering::SeqCst)
    }

    pub(crate) async fn send(&self, frame: &ClientFrame) -> GatewayResult<()> {
        let message = encode(self.encoding, frame).map_err(GatewayError::Encode)?;
        self.writer
            .lock()
            .await
            .send(message)
            .await
            .map_err(|e| GatewayError::Send(Box::new(e)))?;
        tracing::trace!(session = self.id, kind = frame.kind(), "Frame sent");
        Ok(())
    }

    /// Send a close frame and shut the write half; errors are expected if the peer already left
    pub(crate) async fn close(&self) {
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.send(Message::Close(None)).await {
            tracing::debug!(session = self.id, error = %e, "Close frame not sent");
        }
        if let Err(e) = writer.close().await {
            tracing::debug!(session = self.id, error = %e, "Transport already closed");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("encoding", &self.encoding)
            .finish()
    }
}
