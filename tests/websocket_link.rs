//! End-to-end tests for the WebSocket link.
//!
//! Each test starts a loopback logging endpoint (axum WebSocket route) and
//! drives a real `ConnectionService` against it.
//!
//! The endpoint answers every batch with `{"success": true}` unless an
//! action asks otherwise:
//! - `{"type": "fail"}` - reply `{"success": false, "error": "disk full"}`
//! - `{"type": "rename"}` - reply with `newUserId: "u-assigned"`
//! - `{"type": "hangup"}` - reply, then close the socket and wait for the
//!   client's close reply

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};

use actionlog_link::adapters::StaticParams;
use actionlog_link::application::{
    ConnectionHandle, ConnectionService, ConnectionSnapshot, ManagerConfig,
};
use actionlog_link::domain::connection::ConnectionState;

// ════════════════════════════════════════════════════════════════════════════
// Loopback endpoint
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Default)]
struct Endpoint {
    connections: Arc<Mutex<Vec<HashMap<String, String>>>>,
    batches: Arc<Mutex<Vec<Value>>>,
    close_replies: Arc<Mutex<usize>>,
}

impl Endpoint {
    fn connections(&self) -> Vec<HashMap<String, String>> {
        self.connections.lock().unwrap().clone()
    }

    fn batches(&self) -> Vec<Value> {
        self.batches.lock().unwrap().clone()
    }

    fn close_replies(&self) -> usize {
        *self.close_replies.lock().unwrap()
    }
}

async fn upgrade(
    ws: WebSocketUpgrade,
    Query(query): Query<HashMap<String, String>>,
    State(endpoint): State<Endpoint>,
) -> Response {
    endpoint.connections.lock().unwrap().push(query);
    ws.on_upgrade(move |socket| serve_socket(socket, endpoint))
}

async fn serve_socket(mut socket: WebSocket, endpoint: Endpoint) {
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else { continue };
        let Ok(batch) = serde_json::from_str::<Value>(&text) else { continue };
        endpoint.batches.lock().unwrap().push(batch.clone());

        let kinds: Vec<String> = batch["userActions"]
            .as_array()
            .map(|actions| {
                actions
                    .iter()
                    .filter_map(|a| a["type"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        let has = |kind: &str| kinds.iter().any(|k| k == kind);

        let reply = if has("fail") {
            json!({"success": false, "error": "disk full"})
        } else if has("rename") {
            json!({"success": true, "newUserId": "u-assigned"})
        } else {
            json!({"success": true})
        };
        if socket.send(Message::Text(reply.to_string())).await.is_err() {
            return;
        }

        if has("hangup") {
            let _ = socket.send(Message::Close(None)).await;
            let reply = tokio::time::timeout(Duration::from_secs(2), socket.recv()).await;
            if let Ok(Some(Ok(Message::Close(_)))) = reply {
                *endpoint.close_replies.lock().unwrap() += 1;
            }
            return;
        }
    }
}

async fn start_endpoint() -> (String, Endpoint) {
    let endpoint = Endpoint::default();
    let app = Router::new()
        .route("/", get(upgrade))
        .with_state(endpoint.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("ws://{}", addr), endpoint)
}

// ════════════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════════════

fn spawn_link(params: StaticParams, reconnect_delay: Duration) -> ConnectionHandle {
    let config = ManagerConfig::default()
        .with_auth_key("test-key")
        .with_reconnect_delay(reconnect_delay);
    ConnectionService::spawn(config, Arc::new(params))
}

/// Polls `check` until it returns true or five seconds pass.
async fn wait_until(what: &str, check: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {what}");
}

/// Polls the link until its snapshot satisfies `check`.
async fn wait_for(
    link: &ConnectionHandle,
    what: &str,
    check: impl Fn(&ConnectionSnapshot) -> bool,
) -> ConnectionSnapshot {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        let snapshot = link.snapshot().await.unwrap();
        if check(&snapshot) {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {what}");
}

async fn wait_open(link: &ConnectionHandle) {
    wait_for(link, "link to open", |s| s.is_open).await;
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn connects_with_identity_and_delivers_actions() {
    let (url, endpoint) = start_endpoint().await;
    let params = StaticParams::new().with("user", "u1").with("task", "t 1");
    let link = spawn_link(params, Duration::from_secs(5));

    link.connect(Some(url.clone())).await.unwrap();
    wait_open(&link).await;

    let connections = endpoint.connections();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].get("userId").map(String::as_str), Some("u1"));
    assert_eq!(connections[0].get("taskId").map(String::as_str), Some("t 1"));

    let sent = link
        .send_actions(vec![json!({"type": "click", "x": 10})])
        .await
        .unwrap();
    assert!(sent);

    wait_until("batch to arrive", || endpoint.batches().len() == 1).await;
    let batch = &endpoint.batches()[0];
    assert_eq!(batch["authKey"], "test-key");
    assert_eq!(batch["userActions"], json!([{"type": "click", "x": 10}]));

    let snapshot = link.snapshot().await.unwrap();
    assert_eq!(snapshot.state, ConnectionState::Open);
    assert_eq!(snapshot.last_url.as_deref(), Some(url.as_str()));

    link.shutdown().await.unwrap();
}

#[tokio::test]
async fn save_failure_is_reported_and_cleared() {
    let (url, _endpoint) = start_endpoint().await;
    let link = spawn_link(StaticParams::new(), Duration::from_secs(5));
    link.connect(Some(url)).await.unwrap();
    wait_open(&link).await;

    link.send_actions(vec![json!({"type": "fail"})]).await.unwrap();
    let snapshot = wait_for(&link, "save error", |s| s.has_save_error).await;
    assert_eq!(snapshot.last_error_detail.as_deref(), Some("disk full"));

    link.send_actions(vec![json!({"type": "click"})]).await.unwrap();
    let snapshot = wait_for(&link, "save error to clear", |s| !s.has_save_error).await;
    assert_eq!(snapshot.last_error_detail, None);

    link.shutdown().await.unwrap();
}

#[tokio::test]
async fn assigned_user_id_is_used_on_reconnect() {
    let (url, endpoint) = start_endpoint().await;
    let link = spawn_link(StaticParams::new().with("task", "t1"), Duration::from_millis(50));
    link.connect(Some(url)).await.unwrap();
    wait_open(&link).await;
    assert_eq!(endpoint.connections()[0].get("userId"), None);

    link.send_actions(vec![json!({"type": "rename"}), json!({"type": "hangup"})])
        .await
        .unwrap();
    wait_for(&link, "assigned user id", |s| {
        s.user_id.as_deref() == Some("u-assigned")
    })
    .await;

    wait_until("second connection", || endpoint.connections().len() == 2).await;
    let second = &endpoint.connections()[1];
    assert_eq!(second.get("userId").map(String::as_str), Some("u-assigned"));
    assert_eq!(second.get("taskId").map(String::as_str), Some("t1"));

    link.shutdown().await.unwrap();
}

#[tokio::test]
async fn reconnects_after_endpoint_hangs_up() {
    let (url, endpoint) = start_endpoint().await;
    let link = spawn_link(StaticParams::new(), Duration::from_millis(50));
    link.connect(Some(url)).await.unwrap();
    wait_open(&link).await;

    link.send_actions(vec![json!({"type": "hangup"})]).await.unwrap();
    wait_until("second connection", || endpoint.connections().len() == 2).await;
    wait_open(&link).await;
    assert!(!link.is_reconnecting().await.unwrap());
    wait_until("close handshake", || endpoint.close_replies() == 1).await;

    assert!(link.send_actions(vec![json!({"type": "click"})]).await.unwrap());
    wait_until("batch on new connection", || endpoint.batches().len() == 2).await;

    link.shutdown().await.unwrap();
}

#[tokio::test]
async fn unreachable_endpoint_keeps_retrying() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let link = spawn_link(StaticParams::new(), Duration::from_millis(50));
    link.connect(Some(format!("ws://{}", addr))).await.unwrap();

    wait_for(&link, "reconnect to be scheduled", |s| s.is_reconnecting).await;
    assert!(!link.is_open().await.unwrap());
    assert!(!link.send_actions(vec![json!({"type": "click"})]).await.unwrap());

    link.reset_state().await.unwrap();
    assert!(!link.is_reconnecting().await.unwrap());

    link.shutdown().await.unwrap();
}

#[tokio::test]
async fn handle_reports_stopped_after_shutdown() {
    let link = spawn_link(StaticParams::new(), Duration::from_secs(5));
    link.shutdown().await.unwrap();

    wait_until("actor to exit", || link.is_stopped()).await;
    assert!(link.is_open().await.is_err());
}
