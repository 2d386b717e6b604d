//! Route handlers

use crate::error::{RelayError, RelayResult};
use crate::relay::{ChatReply, ChatRequest};
use crate::server::AppState;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

/// `POST /api/chat`
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> RelayResult<Json<ChatReply>> {
    let Json(body) = payload.map_err(reject_body)?;

    let message_count = body
        .get("messages")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    let has_image = body
        .get("imageData")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty());
    tracing::info!(
        "Received chat request: {} messages, image={}",
        message_count,
        has_image
    );

    let request = ChatRequest::from_json(body)?;
    let reply = state.relay.handle(request).await?;

    tracing::debug!("Reply is {} characters", reply.response.len());
    Ok(Json(reply))
}

/// `GET /api/test`
pub async fn health() -> Json<Value> {
    Json(json!({ "message": "Server is running!" }))
}

/// `DELETE /api/session/:id`
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> RelayResult<StatusCode> {
    state.relay.reset_session(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn reject_body(rejection: JsonRejection) -> RelayError {
    let message = rejection.body_text();
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RelayError::PayloadTooLarge(message)
    } else {
        RelayError::MalformedBody(message)
    }
}
