//! Common test utilities and helpers
//!
//! - Mock remote authority (wiremock)
//! - Config fixtures with short timeouts and a parked poll loop
//! - Wire payload builders

#![allow(dead_code)]

use std::time::Duration;

use nutrisync::client::local_store::{LocalStateStore, MemoryStore};
use nutrisync::client::{Config, Session};
use nutrisync::shared::AppConfig;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Poll period long enough that only explicit ticks run during a test
pub const PARKED_POLL: Duration = Duration::from_secs(3600);

/// Config pointing at `server` with a short request bound
pub fn config_for(server: &MockServer) -> Config {
    Config::with_builder(
        AppConfig::builder()
            .server_url(server.uri())
            .request_timeout(Duration::from_millis(500))
            .poll_interval(PARKED_POLL)
            .health_interval(PARKED_POLL),
    )
    .expect("valid test config")
}

/// Remote authority whose health check succeeds and whose snapshots are fixed
pub async fn healthy_remote(roster: Value, messages: Value) -> MockServer {
    let server = MockServer::start().await;
    mount_health(&server, 200).await;
    mount_snapshots(&server, roster, messages).await;
    mount_accepting_posts(&server).await;
    server
}

/// Remote authority whose health check fails
pub async fn unhealthy_remote() -> MockServer {
    let server = MockServer::start().await;
    mount_health(&server, 503).await;
    server
}

pub async fn mount_health(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub async fn mount_snapshots(server: &MockServer, roster: Value, messages: Value) {
    Mock::given(method("GET"))
        .and(path("/online-users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(roster))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chat-messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(messages))
        .mount(server)
        .await;
}

pub async fn mount_accepting_posts(server: &MockServer) {
    for endpoint in ["/online-users", "/chat-messages"] {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }
}

/// Session over an in-memory store
pub async fn start_session(config: Config) -> (Session, MemoryStore) {
    let store = MemoryStore::new();
    let session = Session::start(config, LocalStateStore::new(store.clone())).await;
    (session, store)
}

pub fn wire_user(id: &str, name: &str, online: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "avatar": "",
        "isOnline": online,
        "lastSeen": "2024-05-01T10:00:00Z",
        "profileEnabled": true,
    })
}

pub fn wire_message(id: Option<&str>, user_id: &str, body: &str) -> Value {
    let mut value = json!({
        "userId": user_id,
        "userName": user_id,
        "message": body,
        "timestamp": "2024-05-01T10:00:00Z",
        "type": "text",
    });
    if let Some(id) = id {
        value["id"] = json!(id);
    }
    value
}
