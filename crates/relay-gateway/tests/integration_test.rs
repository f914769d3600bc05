//! Integration tests for the HTTP action gateway against a local fake agent.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use relay_common::test_utils::init_test_logging;
use relay_gateway::{ActionGateway, ActionRequest, AgentControl, GatewayError, HttpActionGateway};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

type Received = Arc<Mutex<Vec<(String, Value)>>>;

async fn record_action(State(received): State<Received>, Json(body): Json<Value>) -> Json<Value> {
    let action = body["action"].as_str().unwrap_or_default().to_string();
    received.lock().push(("agent/action".to_string(), body));

    if action == "perform-reading" {
        Json(json!({
            "status": "success",
            "result": {
                "image_url": "https://images.example/moon.png",
                "reading_long": "The Moon hides the path.",
                "reading_short": "Moon.",
                "prompt": "moonlit path"
            }
        }))
    } else {
        Json(json!({"status": "success"}))
    }
}

async fn record_load(
    State(received): State<Received>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    received.lock().push((format!("agents/{name}/load"), body));
    Json(json!({"status": "success", "agent": name}))
}

async fn status(Path(connection): Path<String>) -> Json<Value> {
    Json(json!({"name": connection, "configured": true}))
}

async fn spawn_agent(received: Received) -> SocketAddr {
    let app = Router::new()
        .route("/agent/action", post(record_action))
        .route("/agents/:name/load", post(record_load))
        .route("/connections/:connection/status", get(status))
        .route("/agent/start", post(|| async { Json(json!({"status": "success"})) }))
        .route(
            "/agent/stop",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route("/broken/agent/action", post(|| async { "not json" }))
        .with_state(received);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn gateway_for(base_url: String) -> HttpActionGateway {
    HttpActionGateway::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_execute_posts_action_triple() {
    init_test_logging();
    let received: Received = Arc::default();
    let addr = spawn_agent(received.clone()).await;
    let gateway = gateway_for(format!("http://{addr}"));

    let response = gateway
        .execute(&ActionRequest::send_message("telegram", -42_i64, "hi"))
        .await
        .unwrap();
    assert!(response.is_success());

    let calls = received.lock().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].1,
        json!({"connection": "telegram", "action": "send-message", "params": ["-42", "hi"]})
    );
}

#[tokio::test]
async fn test_execute_decodes_reading() {
    let received: Received = Arc::default();
    let addr = spawn_agent(received).await;
    let gateway = gateway_for(format!("http://{addr}/"));

    let response = gateway
        .execute(&ActionRequest::perform_reading("tarot-reader"))
        .await
        .unwrap();
    let reading = response.reading().unwrap();
    assert_eq!(reading.reading_long, "The Moon hides the path.");
    assert_eq!(reading.image_url, "https://images.example/moon.png");
}

#[tokio::test]
async fn test_lifecycle_endpoints() {
    let received: Received = Arc::default();
    let addr = spawn_agent(received.clone()).await;
    let gateway = gateway_for(format!("http://{addr}"));

    let loaded = gateway.load_agent("tarot-reader").await.unwrap();
    assert_eq!(loaded["agent"], "tarot-reader");
    assert_eq!(received.lock()[0], ("agents/tarot-reader/load".to_string(), json!({})));

    let status = gateway.connection_status("telegram").await.unwrap();
    assert_eq!(status["configured"], true);

    assert!(gateway.start_agent().await.is_ok());
}

#[tokio::test]
async fn test_http_error_status_is_reported() {
    let received: Received = Arc::default();
    let addr = spawn_agent(received).await;
    let gateway = gateway_for(format!("http://{addr}"));

    let error = gateway.stop_agent().await.unwrap_err();
    assert!(matches!(error, GatewayError::Status { status: 500, .. }));
    assert!(error.url().ends_with("/agent/stop"));
}

#[tokio::test]
async fn test_invalid_body_is_decode_error() {
    let received: Received = Arc::default();
    let addr = spawn_agent(received).await;
    let gateway = gateway_for(format!("http://{addr}/broken"));

    let error = gateway
        .execute(&ActionRequest::perform_reading("tarot-reader"))
        .await
        .unwrap_err();
    assert!(matches!(error, GatewayError::Decode { .. }));
}

#[tokio::test]
async fn test_unreachable_gateway_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = gateway_for(format!("http://{addr}"));
    let error = gateway
        .execute(&ActionRequest::send_message("telegram", 1_i64, "hi"))
        .await
        .unwrap_err();
    assert!(matches!(error, GatewayError::Transport { .. }));
}
