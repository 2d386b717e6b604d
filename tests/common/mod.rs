use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use chatrelay::config::{Config, ConversationMode};
use chatrelay::providers::OpenAiClient;
use chatrelay::relay::ChatRelay;
use chatrelay::server::{build_router, AppState};

/// 1x1 transparent PNG
#[allow(dead_code)]
pub const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Config pointing the relay at a mock upstream
#[allow(dead_code)]
pub fn test_config(api_base: &str, static_dir: &Path, mode: ConversationMode) -> Config {
    let mut config = Config::default();
    config.provider.api_base = api_base.to_string();
    config.provider.api_key = Some("sk-test".to_string());
    config.provider.timeout_seconds = 5;
    config.server.static_dir = static_dir.to_path_buf();
    config.conversation.mode = mode;
    config
}

/// Full application router backed by the real OpenAI client
#[allow(dead_code)]
pub fn test_app(config: &Config) -> Router {
    let client = OpenAiClient::new(&config.provider).expect("failed to create client");
    let relay = ChatRelay::from_config(Arc::new(client), config);
    build_router(AppState::new(relay), config)
}

/// Send a request through the router and decode the JSON reply
#[allow(dead_code)]
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body)),
        None => builder.body(Body::empty()),
    }
    .expect("failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).to_string())
        })
    };
    (status, value)
}

/// POST a JSON body to `/api/chat`
#[allow(dead_code)]
pub async fn post_chat(app: &Router, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, "/api/chat", Some(body.to_string())).await
}

/// A Responses API reply with a single text item
#[allow(dead_code)]
pub fn response_json(id: &str, text: &str) -> Value {
    json!({
        "id": id,
        "object": "response",
        "status": "completed",
        "output": [{
            "type": "message",
            "id": format!("msg_{}", id),
            "role": "assistant",
            "status": "completed",
            "content": [{"type": "output_text", "text": text, "annotations": []}]
        }],
        "usage": {"input_tokens": 10, "output_tokens": 5, "total_tokens": 15}
    })
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
