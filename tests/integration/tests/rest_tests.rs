//! REST Integration Tests
//!
//! Exercise the request pipeline and rate limiter against a mock HTTP server.
//!
//! Run with: cargo test -p integration-tests --test rest_tests

use std::time::{Duration, Instant};

use chat_client::Client;
use chat_core::ApiError;
use chat_rest::{CustomRateLimit, RestError, MAX_RESET_WAIT};
use integration_tests::{api_error, eventually, fixtures::*, test_config, to_json, TEST_TOKEN};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UNUSED_GATEWAY: &str = "ws://127.0.0.1:1";

fn client_for(server: &MockServer) -> Client {
    Client::new(test_config(&server.uri(), UNUSED_GATEWAY)).expect("client")
}

// ============================================================================
// Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_self_sends_token_and_caches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .and(header("x-bot-token", TEST_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(to_json(&user())))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let me = client.rest().fetch_self().await.unwrap();

    assert_eq!(me.id, USER_ID);
    let state = client.state();
    assert!(eventually(Duration::from_secs(2), || state.get_user(USER_ID).is_ok()).await);
    assert_eq!(state.get_user(USER_ID).unwrap().username, "alice");
}

#[tokio::test]
async fn test_disabled_cache_skips_write_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/users/{USER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(to_json(&user())))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), UNUSED_GATEWAY);
    config.cache.enabled = false;
    let client = Client::new(config).unwrap();

    client.rest().fetch_user(USER_ID).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(client.state().get_user(USER_ID).is_err());
}

#[tokio::test]
async fn test_delete_message_accepts_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/channels/{CHANNEL_ID}/messages/m1")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.rest().delete_message(CHANNEL_ID, "m1").await.unwrap();
}

// ============================================================================
// Error Classification Tests
// ============================================================================

#[tokio::test]
async fn test_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.rest().fetch_self().await.unwrap_err();

    assert!(matches!(err, RestError::Unauthorized { ref body } if body == "bad token"));
    assert!(err.is_api_error());
}

#[tokio::test]
async fn test_typed_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/servers/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(api_error("NotFound")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.rest().fetch_server("missing").await.unwrap_err();

    match err {
        RestError::Api { status, error } => {
            assert_eq!(status, 404);
            assert_eq!(error, ApiError::NotFound);
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreadable_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/servers/s1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.rest().fetch_server("s1").await.unwrap_err();

    assert!(matches!(
        err,
        RestError::Api {
            status: 500,
            error: ApiError::Unknown
        }
    ));
}

// ============================================================================
// Retry Tests
// ============================================================================

#[tokio::test]
async fn test_bad_gateway_exhausts_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), UNUSED_GATEWAY);
    config.api.max_retries = 2;
    let client = Client::new(config).unwrap();

    let err = client.rest().fetch_self().await.unwrap_err();
    assert!(matches!(
        err,
        RestError::ExceededRetries {
            status: 502,
            attempts: 3
        }
    ));
    assert!(err.is_transport_error());
}

#[tokio::test]
async fn test_bad_gateway_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(to_json(&user())))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let me = client.rest().fetch_self().await.unwrap();

    assert_eq!(me.id, USER_ID);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_too_many_requests_waits_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({ "retry_after": 300 })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(to_json(&user())))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let started = Instant::now();
    client.rest().fetch_self().await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_too_many_requests_without_auto_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({ "retry_after": 1500 })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), UNUSED_GATEWAY);
    config.api.retry_on_rate_limit = false;
    let client = Client::new(config).unwrap();

    let err = client.rest().fetch_self().await.unwrap_err();
    assert!(matches!(
        err,
        RestError::RateLimited { retry_after } if retry_after == Duration::from_millis(1500)
    ));
}

#[tokio::test]
async fn test_too_many_requests_huge_retry_after_is_capped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({ "retry_after": 1e30 })))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), UNUSED_GATEWAY);
    config.api.retry_on_rate_limit = false;
    let client = Client::new(config).unwrap();

    let err = client.rest().fetch_self().await.unwrap_err();
    assert!(matches!(
        err,
        RestError::RateLimited { retry_after } if retry_after == MAX_RESET_WAIT
    ));
}

#[tokio::test]
async fn test_too_many_requests_unreadable_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), UNUSED_GATEWAY);
    config.api.retry_on_rate_limit = false;
    let client = Client::new(config).unwrap();

    let err = client.rest().fetch_self().await.unwrap_err();
    assert!(matches!(
        err,
        RestError::RateLimited { retry_after } if retry_after == Duration::ZERO
    ));
    assert!(err.is_transport_error());
}

// ============================================================================
// Rate Limit Tests
// ============================================================================

#[tokio::test]
async fn test_malformed_rate_limit_header_keeps_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(to_json(&user()))
                .insert_header("x-ratelimit-remaining", "n/a")
                .insert_header("x-ratelimit-reset-after", "1e30"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let me = client.rest().fetch_self().await.unwrap();
    assert_eq!(me.id, USER_ID);
}

#[tokio::test]
async fn test_exhausted_bucket_delays_next_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(to_json(&user()))
                .insert_header("x-ratelimit-limit", "1")
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset-after", "400"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.rest().fetch_self().await.unwrap();

    let started = Instant::now();
    client.rest().fetch_self().await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(250));
}

#[tokio::test]
async fn test_buckets_are_independent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(to_json(&user()))
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset-after", "5000"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/servers/{SERVER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(to_json(&server_fixture())))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.rest().fetch_self().await.unwrap();

    let started = Instant::now();
    client.rest().fetch_server(SERVER_ID).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_custom_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/users/{USER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(to_json(&user())))
        .mount(&server)
        .await;

    let client = Client::builder()
        .config(test_config(&server.uri(), UNUSED_GATEWAY))
        .custom_limit(CustomRateLimit::new("users", 1, Duration::from_millis(300)))
        .build()
        .unwrap();

    client.rest().fetch_user(USER_ID).await.unwrap();
    let started = Instant::now();
    client.rest().fetch_user(USER_ID).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(200));
}

fn server_fixture() -> chat_core::Server {
    integration_tests::fixtures::server()
}
