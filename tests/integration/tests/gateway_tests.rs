//! Gateway Integration Tests
//!
//! Drive a real client against the in-process fake gateway.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::sync::Arc;
use std::time::Duration;

use chat_client::{Client, ClientError};
use chat_gateway::events::ChannelStartTypingEvent;
use chat_gateway::{ControlMessage, GatewayError, StatusPayload, WsState};
use integration_tests::{
    bulk_frame, eventually, fixtures::*, test_config, typing_frame, FakeGateway, GatewayScript,
    TEST_TOKEN,
};
use parking_lot::Mutex;

const UNUSED_API: &str = "http://127.0.0.1:1";
const SETTLE: Duration = Duration::from_secs(3);

fn client_for(gateway: &FakeGateway) -> Client {
    Client::new(test_config(UNUSED_API, &gateway.url())).expect("client")
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_open_authenticates_once() {
    let gateway = FakeGateway::start().await.unwrap();
    let client = client_for(&gateway);

    client.open().await.unwrap();
    assert_eq!(client.connection_state(), WsState::Open);

    assert!(eventually(SETTLE, || gateway.received_of("Authenticate").len() == 1).await);
    let auth = &gateway.received_of("Authenticate")[0];
    assert_eq!(auth["token"], TEST_TOKEN);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(gateway.received_of("Authenticate").len(), 1);
    assert_eq!(gateway.connections(), 1);

    client.close().await;
}

#[tokio::test]
async fn test_second_open_is_rejected() {
    let gateway = FakeGateway::start().await.unwrap();
    let client = client_for(&gateway);

    client.open().await.unwrap();
    let err = client.open().await.unwrap_err();
    assert!(matches!(err, ClientError::Gateway(GatewayError::AlreadyOpen)));

    client.close().await;
}

#[tokio::test]
async fn test_close_ends_wait_without_reason() {
    let gateway = FakeGateway::start().await.unwrap();
    let client = client_for(&gateway);
    client.open().await.unwrap();
    assert!(eventually(SETTLE, || gateway.received_of("Authenticate").len() == 1).await);

    let waiter = {
        let client = client.clone();
        tokio::spawn(async move { client.wait().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    client.close().await;
    let reason = tokio::time::timeout(SETTLE, waiter).await.unwrap().unwrap();
    assert_eq!(reason, None);
    assert_eq!(client.connection_state(), WsState::Closed);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(gateway.connections(), 1);
}

#[tokio::test]
async fn test_invalid_session_is_fatal() {
    let gateway = FakeGateway::start_with(GatewayScript::rejecting("InvalidSession"))
        .await
        .unwrap();
    let client = client_for(&gateway);

    client.open().await.unwrap();
    let reason = tokio::time::timeout(SETTLE, client.wait()).await.unwrap();
    assert_eq!(reason.as_deref(), Some("invalid session"));
    assert_eq!(client.connection_state(), WsState::Closed);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(gateway.connections(), 1);
}

#[tokio::test]
async fn test_open_against_missing_gateway_fails() {
    let mut config = test_config(UNUSED_API, "ws://127.0.0.1:1");
    config.gateway.connect_timeout_ms = 500;
    let client = Client::new(config).unwrap();

    assert!(client.open().await.is_err());
    assert_eq!(client.connection_state(), WsState::Closed);
    assert_eq!(client.wait().await, None);
}

// ============================================================================
// Reconnect Tests
// ============================================================================

#[tokio::test]
async fn test_error_restarts_once() {
    let gateway = FakeGateway::start().await.unwrap();
    let client = client_for(&gateway);
    client.open().await.unwrap();
    assert!(eventually(SETTLE, || gateway.received_of("Authenticate").len() == 1).await);

    let mut status = client.subscribe().expect("status topic");
    assert!(client.gateway().post(ControlMessage::Error("test".to_string())));

    let mut seen = Vec::new();
    while !seen.contains(&StatusPayload::Opened) {
        let payload = tokio::time::timeout(SETTLE, status.recv())
            .await
            .unwrap()
            .unwrap();
        seen.push(payload);
    }
    assert_eq!(seen[0], StatusPayload::EndOfSession);

    assert!(eventually(SETTLE, || gateway.received_of("Authenticate").len() == 2).await);
    assert_eq!(client.gateway().sessions_opened(), 2);
    assert_eq!(gateway.connections(), 2);
    assert_eq!(client.connection_state(), WsState::Open);

    client.close().await;
}

#[tokio::test]
async fn test_server_close_triggers_reconnect() {
    let gateway = FakeGateway::start().await.unwrap();
    let client = client_for(&gateway);
    client.open().await.unwrap();
    assert!(eventually(SETTLE, || gateway.received_of("Authenticate").len() == 1).await);

    gateway.close_connections();

    assert!(eventually(SETTLE, || gateway.received_of("Authenticate").len() == 2).await);
    assert_eq!(gateway.connections(), 2);
    assert!(eventually(SETTLE, || client.connection_state() == WsState::Open).await);

    client.close().await;
}

#[tokio::test]
async fn test_explicit_restart() {
    let gateway = FakeGateway::start().await.unwrap();
    let client = client_for(&gateway);
    client.open().await.unwrap();
    assert!(eventually(SETTLE, || gateway.connections() == 1).await);

    client.restart().unwrap();

    assert!(eventually(SETTLE, || gateway.connections() == 2).await);
    assert!(eventually(SETTLE, || client.gateway().sessions_opened() == 2).await);

    client.close().await;
}

// ============================================================================
// Heartbeat Tests
// ============================================================================

#[tokio::test]
async fn test_heartbeat_pings_after_auth() {
    let gateway = FakeGateway::start().await.unwrap();
    let mut config = test_config(UNUSED_API, &gateway.url());
    config.gateway.heartbeat_interval_ms = 50;
    config.gateway.read_timeout_ms = 1_000;
    let client = Client::new(config).unwrap();

    client.open().await.unwrap();
    assert!(eventually(SETTLE, || gateway.received_of("Ping").len() >= 3).await);

    // Pongs keep refreshing the read deadline
    assert_eq!(gateway.connections(), 1);
    assert_eq!(client.connection_state(), WsState::Open);

    client.close().await;
}

#[tokio::test]
async fn test_no_heartbeat_before_auth() {
    let gateway = FakeGateway::start_with(GatewayScript {
        auth_reply: serde_json::json!({ "type": "NotReady" }),
        after_auth: Vec::new(),
    })
    .await
    .unwrap();
    let mut config = test_config(UNUSED_API, &gateway.url());
    config.gateway.heartbeat_interval_ms = 50;
    let client = Client::new(config).unwrap();

    client.open().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(gateway.received_of("Ping").is_empty());

    client.close().await;
}

// ============================================================================
// Event Tests
// ============================================================================

#[tokio::test]
async fn test_ready_seeds_cache() {
    let gateway = FakeGateway::start_with(GatewayScript::default().then(ready_frame()))
        .await
        .unwrap();
    let client = client_for(&gateway);

    client.open().await.unwrap();

    let state = Arc::clone(client.state());
    assert!(eventually(SETTLE, || state.get_user(USER_ID).is_ok()).await);
    assert_eq!(state.get_server(SERVER_ID).unwrap().name, "Test Server");
    assert_eq!(
        state.get_channel(CHANNEL_ID).unwrap().name.as_deref(),
        Some("general")
    );
    assert!(state.get_member(SERVER_ID, USER_ID).is_ok());
    assert_eq!(state.get_emoji(EMOJI_ID).unwrap().name, "wave");

    client.close().await;
}

#[tokio::test]
async fn test_bulk_dispatches_in_order() {
    let gateway = FakeGateway::start().await.unwrap();
    let client = client_for(&gateway);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    client.on::<ChannelStartTypingEvent, _>(move |_, event| {
        sink.lock().push(event.id.clone());
        Ok(())
    });

    client.open().await.unwrap();
    assert!(eventually(SETTLE, || gateway.received_of("Authenticate").len() == 1).await);

    gateway.push(bulk_frame(vec![
        typing_frame("c1", USER_ID),
        serde_json::json!({ "id": "untyped" }),
        typing_frame("c2", USER_ID),
        typing_frame("c3", USER_ID),
    ]));

    assert!(eventually(SETTLE, || seen.lock().len() == 3).await);
    assert_eq!(*seen.lock(), vec!["c1", "c2", "c3"]);

    client.close().await;
}

#[tokio::test]
async fn test_failing_handler_does_not_stop_siblings() {
    let gateway = FakeGateway::start().await.unwrap();
    let client = client_for(&gateway);

    let errors = Arc::new(Mutex::new(0));
    let error_count = Arc::clone(&errors);
    client.dispatcher().on_error(move |_, _| *error_count.lock() += 1);

    let seen = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&seen);
    client.on::<ChannelStartTypingEvent, _>(|_, _| Err("boom".into()));
    client.on::<ChannelStartTypingEvent, _>(move |_, _| {
        *sink.lock() += 1;
        Ok(())
    });

    client.open().await.unwrap();
    assert!(eventually(SETTLE, || gateway.received_of("Authenticate").len() == 1).await);
    gateway.push(typing_frame(CHANNEL_ID, USER_ID));

    assert!(eventually(SETTLE, || *seen.lock() == 1).await);
    assert!(eventually(SETTLE, || *errors.lock() == 1).await);
    assert_eq!(client.connection_state(), WsState::Open);

    client.close().await;
}

#[tokio::test]
async fn test_typing_frames_reach_server() {
    let gateway = FakeGateway::start().await.unwrap();
    let client = client_for(&gateway);
    client.open().await.unwrap();

    client.gateway().begin_typing(CHANNEL_ID).await.unwrap();
    client.gateway().end_typing(CHANNEL_ID).await.unwrap();

    assert!(eventually(SETTLE, || gateway.received_of("EndTyping").len() == 1).await);
    let begin = gateway.received_of("BeginTyping");
    assert_eq!(begin.len(), 1);
    assert_eq!(begin[0]["channel"], CHANNEL_ID);

    client.close().await;
}
