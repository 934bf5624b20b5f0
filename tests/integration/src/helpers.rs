//! Test helpers for integration tests
//!
//! Provides a scripted gateway server, client configuration pointing at
//! local endpoints, and polling utilities.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chat_common::{ClientConfig, Token};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub const TEST_TOKEN: &str = "test-token";

/// What the fake gateway does once a client authenticates
#[derive(Debug, Clone)]
pub struct GatewayScript {
    /// Sent in answer to every `Authenticate` frame
    pub auth_reply: Value,
    /// Sent after the reply, in order
    pub after_auth: Vec<Value>,
}

impl GatewayScript {
    pub fn rejecting(error: &str) -> Self {
        Self {
            auth_reply: json!({ "type": "Error", "error": error }),
            after_auth: Vec::new(),
        }
    }

    #[must_use]
    pub fn then(mut self, frame: Value) -> Self {
        self.after_auth.push(frame);
        self
    }
}

impl Default for GatewayScript {
    fn default() -> Self {
        Self {
            auth_reply: json!({ "type": "Authenticated" }),
            after_auth: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
enum Push {
    Frame(Value),
    Close,
}

#[derive(Debug)]
struct Shared {
    script: GatewayScript,
    connections: AtomicUsize,
    received: Mutex<Vec<Value>>,
    push: broadcast::Sender<Push>,
}

/// In-process JSON gateway on an ephemeral port
pub struct FakeGateway {
    addr: SocketAddr,
    shared: Arc<Shared>,
    _handle: JoinHandle<()>,
}

impl FakeGateway {
    /// Start a gateway that accepts every client
    pub async fn start() -> Result<Self> {
        Self::start_with(GatewayScript::default()).await
    }

    pub async fn start_with(script: GatewayScript) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;
        let (push, _) = broadcast::channel(64);
        let shared = Arc::new(Shared {
            script,
            connections: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
            push,
        });

        let accept_shared = Arc::clone(&shared);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&accept_shared)));
            }
        });

        Ok(Self {
            addr,
            shared,
            _handle: handle,
        })
    }

    /// Base URL for `GatewayConfig::url`
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// WebSocket handshakes completed so far
    pub fn connections(&self) -> usize {
        self.shared.connections.load(Ordering::SeqCst)
    }

    /// Every client frame received, across connections
    pub fn received(&self) -> Vec<Value> {
        self.shared.received.lock().clone()
    }

    /// Received client frames of one type
    pub fn received_of(&self, frame_type: &str) -> Vec<Value> {
        self.received()
            .into_iter()
            .filter(|frame| frame["type"] == frame_type)
            .collect()
    }

    /// Send a frame on every live connection
    pub fn push(&self, frame: Value) {
        let _ = self.shared.push.send(Push::Frame(frame));
    }

    /// Close every live connection with a close frame
    pub fn close_connections(&self) {
        let _ = self.shared.push.send(Push::Close);
    }
}

async fn serve(stream: TcpStream, shared: Arc<Shared>) {
    let Ok(ws) = accept_async(stream).await else {
        return;
    };
    shared.connections.fetch_add(1, Ordering::SeqCst);

    let mut pushes = shared.push.subscribe();
    let (mut sender, mut receiver) = ws.split();

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let Some(Ok(message)) = incoming else { break };
                let text = match message {
                    Message::Text(text) => text,
                    Message::Close(_) => break,
                    _ => continue,
                };
                let Ok(frame) = serde_json::from_str::<Value>(&text) else { continue };
                shared.received.lock().push(frame.clone());

                let replies: Vec<Value> = match frame["type"].as_str() {
                    Some("Authenticate") => std::iter::once(shared.script.auth_reply.clone())
                        .chain(shared.script.after_auth.iter().cloned())
                        .collect(),
                    Some("Ping") => vec![json!({ "type": "Pong", "data": frame["data"] })],
                    _ => Vec::new(),
                };
                for reply in replies {
                    if sender.send(Message::Text(reply.to_string())).await.is_err() {
                        return;
                    }
                }
            }
            pushed = pushes.recv() => {
                match pushed {
                    Ok(Push::Frame(frame)) => {
                        if sender.send(Message::Text(frame.to_string())).await.is_err() {
                            break;
                        }
                    }
                    Ok(Push::Close) => {
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

/// Client configuration pointing at local test endpoints
pub fn test_config(api_url: &str, gateway_url: &str) -> ClientConfig {
    let mut config = ClientConfig::new(Token::bot(TEST_TOKEN));
    config.api.base_url = api_url.to_string();
    config.gateway.url = gateway_url.to_string();
    config.gateway.connect_timeout_ms = 2_000;
    config.gateway.read_timeout_ms = 5_000;
    config.gateway.reconnect_max_elapsed_ms = 2_000;
    config
}

/// Poll `check` until it holds or `timeout` passes
pub async fn eventually(timeout: Duration, check: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
