//! Gateway connection manager
//!
//! Each connection runs three workers:
//!
//! - the read loop decodes frames, forwards them to the control queue and
//!   classifies protocol errors
//! - the control-queue processor authenticates, dispatches events and owns
//!   every state transition (shutdown, restart)
//! - the heartbeat pings on an interval once the session is authenticated
//!
//! Workers exit when the status topic announces the end of their session.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chat_common::{GatewayConfig, Token, WireEncoding};
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, sleep_until, timeout, Instant};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use super::classify::{classify, FrameClass};
use super::session::{Session, WsReader};
use super::{ControlMessage, WsState};
use crate::broadcast::{StatusPayload, StatusTopic};
use crate::dispatch::EventDispatcher;
use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{decode, gateway_url, ClientFrame, Envelope, Frame};

/// Delay between connecting and starting the read loop
const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Pause after a classified error before the read loop exits
const ERROR_GRACE: Duration = Duration::from_millis(100);

/// Client side of the gateway event stream.
///
/// Cheap to clone; clones drive the same connection.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<Inner>,
}

struct Inner {
    config: GatewayConfig,
    token: Token,
    dispatcher: Arc<EventDispatcher>,
    state: Mutex<WsState>,
    control: Mutex<Option<mpsc::UnboundedSender<ControlMessage>>>,
    session: Mutex<Option<Arc<Session>>>,
    status: StatusTopic,
    workers: Mutex<Vec<JoinHandle<()>>>,
    sessions_opened: AtomicU64,
    stopping: AtomicBool,
}

impl Gateway {
    pub fn new(config: GatewayConfig, token: Token, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                token,
                dispatcher,
                state: Mutex::new(WsState::Closed),
                control: Mutex::new(None),
                session: Mutex::new(None),
                status: StatusTopic::new(),
                workers: Mutex::new(Vec::new()),
                sessions_opened: AtomicU64::new(0),
                stopping: AtomicBool::new(false),
            }),
        }
    }

    #[inline]
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.inner.dispatcher
    }

    #[inline]
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    pub fn state(&self) -> WsState {
        *self.inner.state.lock()
    }

    pub fn is_open(&self) -> bool {
        self.state() == WsState::Open
    }

    /// Number of connections opened so far, reconnects included
    pub fn sessions_opened(&self) -> u64 {
        self.inner.sessions_opened.load(Ordering::SeqCst)
    }

    /// Connect and start the connection workers
    pub async fn open(&self) -> GatewayResult<()> {
        self.inner.stopping.store(false, Ordering::SeqCst);
        self.inner.open(false).await
    }

    /// Drop the current connection and open a new one
    pub fn restart(&self) -> GatewayResult<()> {
        if self.post(ControlMessage::Restart) {
            Ok(())
        } else {
            Err(GatewayError::NotOpen)
        }
    }

    /// Close for good and wait for the workers to exit
    pub async fn close(&self) {
        self.inner.stopping.store(true, Ordering::SeqCst);
        if !self.post(ControlMessage::Kill) {
            // Nothing live to kill; settle state and release waiters
            *self.inner.state.lock() = WsState::Closed;
            self.inner.status.finish(None);
        }
        self.inner.join_workers().await;
    }

    /// Park until the gateway stops for good; returns the terminal reason, if any
    pub async fn wait(&self) -> Option<String> {
        let mut status = self.inner.status.subscribe()?;
        loop {
            match status.recv().await {
                Ok(StatusPayload::Terminal(reason)) => return reason,
                Err(RecvError::Closed) => return None,
                Ok(_) | Err(RecvError::Lagged(_)) => {}
            }
        }
    }

    /// Lifecycle notifications; `None` before the first `open()` or after a terminal status
    pub fn subscribe(&self) -> Option<broadcast::Receiver<StatusPayload>> {
        self.inner.status.subscribe()
    }

    /// Post a control message to the live connection; false when there is none
    pub fn post(&self, message: ControlMessage) -> bool {
        self.inner.post(message)
    }

    pub async fn begin_typing(&self, channel: &str) -> GatewayResult<()> {
        self.inner.send(&ClientFrame::begin_typing(channel)).await
    }

    pub async fn end_typing(&self, channel: &str) -> GatewayResult<()> {
        self.inner.send(&ClientFrame::end_typing(channel)).await
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("url", &self.inner.config.url)
            .field("state", &self.state())
            .finish()
    }
}

impl Inner {
    // === Opening ===

    async fn open(self: &Arc<Self>, reconnect: bool) -> GatewayResult<()> {
        {
            let mut state = self.state.lock();
            if state.is_active() {
                return Err(GatewayError::AlreadyOpen);
            }
            *state = WsState::Opening;
        }

        self.join_workers().await;

        if let Err(e) = self.connect().await {
            tracing::warn!(error = %e, code = e.code(), reconnect, "Gateway connection failed");
            *self.state.lock() = WsState::Closed;
            *self.control.lock() = None;
            if !reconnect {
                self.status.finish(Some(e.to_string()));
            }
            return Err(e);
        }

        Ok(())
    }

    async fn connect(self: &Arc<Self>) -> GatewayResult<()> {
        let encoding = self.config.encoding;
        let url = gateway_url(&self.config.url, self.config.api_version, encoding)?;
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        self.status.ensure_open();

        tracing::info!(url = %url, encoding = encoding.as_str(), "Connecting to gateway");

        let connect_timeout = self.config.connect_timeout();
        let (stream, _response) = match timeout(connect_timeout, connect_async(url.as_str())).await {
            Ok(Ok(connected)) => connected,
            Ok(Err(e)) => return Err(GatewayError::Connect(Box::new(e))),
            Err(_) => return Err(GatewayError::Timeout(connect_timeout)),
        };
        let (writer, reader) = stream.split();

        let id = self.sessions_opened.fetch_add(1, Ordering::SeqCst) + 1;
        let session = Session::new(id, encoding, writer, &control_tx);
        *self.control.lock() = Some(control_tx);
        *self.session.lock() = Some(Arc::clone(&session));
        *self.state.lock() = WsState::Open;

        let processor = tokio::spawn(Arc::clone(self).process(control_rx, Arc::clone(&session)));
        let status = self.status.subscribe();
        let inner = Arc::clone(self);
        let read_session = Arc::clone(&session);
        let reader = tokio::spawn(async move {
            sleep(SETTLE_DELAY).await;
            inner.read_loop(reader, read_session, status).await;
        });
        self.workers.lock().extend([processor, reader]);

        self.status.publish(StatusPayload::Opened);
        tracing::info!(session = id, "Gateway connected");
        Ok(())
    }

    async fn join_workers(&self) {
        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if let Err(e) = worker.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "Gateway worker panicked");
                }
            }
        }
    }

    // === Read loop ===

    async fn read_loop(
        self: Arc<Self>,
        mut reader: WsReader,
        session: Arc<Session>,
        status: Option<broadcast::Receiver<StatusPayload>>,
    ) {
        let Some(mut status) = status else {
            return;
        };
        let read_timeout = self.config.read_timeout();
        let mut deadline = Instant::now() + read_timeout;

        session.post(ControlMessage::Authenticate);

        loop {
            let next = tokio::select! {
                changed = status.recv() => match changed {
                    Ok(payload) if payload.ends_session() => break,
                    Err(RecvError::Closed) => break,
                    Ok(_) | Err(RecvError::Lagged(_)) => continue,
                },
                () = sleep_until(deadline) => {
                    tracing::warn!(session = session.id(), "No pong before read deadline");
                    session.post(ControlMessage::Error("read deadline exceeded".to_string()));
                    break;
                }
                next = reader.next() => next,
            };

            let message = match next {
                Some(Ok(message)) => message,
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                    tracing::debug!(session = session.id(), "Connection closed");
                    break;
                }
                Some(Err(e)) => {
                    if self.is_current_open(&session) {
                        tracing::warn!(session = session.id(), error = %e, "Gateway read failed");
                        session.post(ControlMessage::Error(e.to_string()));
                    }
                    break;
                }
                None => {
                    if self.is_current_open(&session) {
                        tracing::warn!(session = session.id(), "Gateway stream ended");
                        session.post(ControlMessage::Error("stream ended".to_string()));
                    }
                    break;
                }
            };

            let (bytes, encoding) = match message {
                Message::Text(text) => (text.into_bytes(), WireEncoding::Json),
                Message::Binary(data) => (data, WireEncoding::Binary),
                Message::Close(frame) => {
                    if self.mark_closed(&session) {
                        tracing::warn!(session = session.id(), frame = ?frame, "Gateway closed the connection");
                        session.post(ControlMessage::Error(format!("closed by server: {frame:?}")));
                    }
                    break;
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            };

            if bytes.is_empty() {
                tracing::debug!(session = session.id(), "Empty frame skipped");
                continue;
            }

            let envelope = decode::<Envelope>(encoding, &bytes).unwrap_or_else(|e| {
                tracing::debug!(session = session.id(), error = %e, "Undecodable frame");
                Envelope::internal_error()
            });
            tracing::trace!(session = session.id(), event_type = %envelope.event_type, bytes = bytes.len(), "Frame received");

            session.post(ControlMessage::Event(Frame::new(
                bytes,
                encoding,
                envelope.event_type.clone(),
            )));

            match classify(&envelope) {
                FrameClass::Pong => deadline = Instant::now() + read_timeout,
                FrameClass::Authenticated => {
                    tracing::info!(session = session.id(), "Gateway authenticated");
                    if session.claim_heartbeat() {
                        self.spawn_heartbeat(&session);
                    }
                }
                FrameClass::Fatal(reason) => {
                    tracing::error!(session = session.id(), reason = %reason, "Fatal gateway error");
                    session.post(ControlMessage::Fatal(reason));
                    sleep(ERROR_GRACE).await;
                    break;
                }
                FrameClass::Error(reason) => {
                    tracing::warn!(session = session.id(), reason = %reason, "Gateway error");
                    session.post(ControlMessage::Error(reason));
                    sleep(ERROR_GRACE).await;
                    break;
                }
                FrameClass::Other => {}
            }
        }

        tracing::debug!(session = session.id(), "Read loop stopped");
    }

    // === Heartbeat ===

    fn spawn_heartbeat(self: &Arc<Self>, session: &Arc<Session>) {
        let Some(status) = self.status.subscribe() else {
            return;
        };
        let handle = tokio::spawn(Arc::clone(self).heartbeat(Arc::clone(session), status));
        self.workers.lock().push(handle);
    }

    async fn heartbeat(
        self: Arc<Self>,
        session: Arc<Session>,
        mut status: broadcast::Receiver<StatusPayload>,
    ) {
        let period = self.config.heartbeat_interval();
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                changed = status.recv() => match changed {
                    Ok(payload) if payload.ends_session() => break,
                    Err(RecvError::Closed) => break,
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                },
                _ = ticker.tick() => {
                    if !self.is_current_open(&session) {
                        continue;
                    }
                    match session.send(&ClientFrame::ping()).await {
                        Ok(()) => tracing::trace!(session = session.id(), "Heartbeat sent"),
                        Err(e) => tracing::warn!(session = session.id(), error = %e, "Heartbeat failed"),
                    }
                }
            }
        }

        tracing::debug!(session = session.id(), "Heartbeat stopped");
    }

    // === Control queue ===

    async fn process(
        self: Arc<Self>,
        mut control: mpsc::UnboundedReceiver<ControlMessage>,
        session: Arc<Session>,
    ) {
        while let Some(message) = control.recv().await {
            match message {
                ControlMessage::Kill => {
                    self.shutdown(&session, None).await;
                    return;
                }
                ControlMessage::Fatal(reason) => {
                    self.shutdown(&session, Some(reason)).await;
                    return;
                }
                ControlMessage::Restart => {
                    tracing::info!(session = session.id(), "Restart requested");
                    self.restart(&session).await;
                    return;
                }
                ControlMessage::Error(reason) => {
                    tracing::warn!(session = session.id(), reason = %reason, "Reconnecting after error");
                    self.restart(&session).await;
                    return;
                }
                ControlMessage::Authenticate => {
                    match session.send(&ClientFrame::authenticate(self.token.as_str())).await {
                        Ok(()) => tracing::debug!(session = session.id(), "Authentication sent"),
                        Err(e) => tracing::warn!(session = session.id(), error = %e, "Authentication not sent"),
                    }
                }
                ControlMessage::Event(frame) => {
                    let dispatcher = Arc::clone(&self.dispatcher);
                    tokio::spawn(async move { dispatcher.handle(&frame) });
                }
            }
        }

        // Sender detached without a terminal message
        if self.is_current_open(&session) {
            tracing::warn!(session = session.id(), "Control queue closed while open, restarting");
            self.restart(&session).await;
        }
    }

    async fn shutdown(&self, session: &Arc<Session>, reason: Option<String>) {
        *self.state.lock() = WsState::Closing;
        session.close().await;
        self.release(session);
        *self.state.lock() = WsState::Closed;
        self.status.finish(reason.clone());
        tracing::info!(session = session.id(), reason = ?reason, "Gateway closed");
    }

    async fn restart(self: &Arc<Self>, session: &Arc<Session>) {
        session.close().await;
        *self.state.lock() = WsState::Restarting;
        self.release(session);
        self.status.publish(StatusPayload::EndOfSession);

        if self.stopping.load(Ordering::SeqCst) {
            *self.state.lock() = WsState::Closed;
            self.status.finish(None);
            return;
        }

        let inner = Arc::clone(self);
        tokio::spawn(inner.reconnect());
    }

    // Boxed: reconnect re-enters open(), which spawns the processor that calls back here
    fn reconnect(self: Arc<Self>) -> BoxFuture<'static, ()> {
        async move {
            let mut backoff = ExponentialBackoff {
                max_elapsed_time: Some(self.config.reconnect_max_elapsed()),
                ..ExponentialBackoff::default()
            };
            let mut attempt = 0u32;

            loop {
                if self.stopping.load(Ordering::SeqCst) {
                    *self.state.lock() = WsState::Closed;
                    self.status.finish(None);
                    return;
                }

                attempt += 1;
                let error = match self.open(true).await {
                    Ok(()) => {
                        tracing::info!(attempt, "Gateway reconnected");
                        if self.stopping.load(Ordering::SeqCst) {
                            self.post(ControlMessage::Kill);
                        }
                        return;
                    }
                    Err(GatewayError::AlreadyOpen) => return,
                    Err(e) => e,
                };

                let wait = if error.is_transient() {
                    backoff.next_backoff()
                } else {
                    None
                };
                match wait {
                    Some(wait) => {
                        tracing::warn!(attempt, error = %error, retry_in_ms = wait.as_millis() as u64, "Reconnect failed");
                        sleep(wait).await;
                    }
                    None => {
                        tracing::error!(attempt, error = %error, "Giving up on reconnect");
                        *self.state.lock() = WsState::Closed;
                        self.status.finish(Some(format!("reconnect failed: {error}")));
                        return;
                    }
                }
            }
        }
        .boxed()
    }

    // === Helpers ===

    fn post(&self, message: ControlMessage) -> bool {
        self.control
            .lock()
            .as_ref()
            .is_some_and(|control| control.send(message).is_ok())
    }

    fn is_current(&self, session: &Session) -> bool {
        self.session
            .lock()
            .as_ref()
            .is_some_and(|current| current.id() == session.id())
    }

    fn is_current_open(&self, session: &Session) -> bool {
        *self.state.lock() == WsState::Open && self.is_current(session)
    }

    /// Flip Open to Closed for an unexpected close; false if already leaving Open
    fn mark_closed(&self, session: &Session) -> bool {
        if !self.is_current(session) {
            return false;
        }
        let mut state = self.state.lock();
        if *state != WsState::Open {
            return false;
        }
        *state = WsState::Closed;
        true
    }

    /// Detach `session` and its control queue if it is still current
    fn release(&self, session: &Session) {
        let mut current = self.session.lock();
        if current.as_ref().is_some_and(|s| s.id() == session.id()) {
            *current = None;
            *self.control.lock() = None;
        }
    }

    async fn send(&self, frame: &ClientFrame) -> GatewayResult<()> {
        if *self.state.lock() != WsState::Open {
            return Err(GatewayError::NotOpen);
        }
        let session = self.session.lock().clone().ok_or(GatewayError::NotOpen)?;
        session.send(frame).await
    }
}
