//! Chat relay core
//!
//! Turns a validated browser request into a Responses API request, calls
//! the model client, and updates the session context. HTTP concerns stay
//! in [`crate::server`]; this module only deals in typed requests and
//! [`RelayError`]s.

use crate::config::{Config, ConversationMode};
use crate::error::{RelayError, RelayResult};
use crate::image::ImagePayload;
use crate::providers::{
    ConversationTurn, ResponseInputContent, ResponseInputItem, ResponsesClient, ResponsesRequest,
    Role,
};
use crate::session::{SessionContext, SessionStore};

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Longest accepted client-supplied session id
const MAX_SESSION_ID_LEN: usize = 128;

/// A validated chat request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// Ordered conversation turns
    pub messages: Vec<ConversationTurn>,
    /// Normalized image, if one was attached
    pub image: Option<ImagePayload>,
    /// Session to continue, if the client has one
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// Validate a raw JSON body
    ///
    /// `messages` must be an array of `{role, content}` objects. An empty
    /// or null `imageData` counts as no image.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for a malformed turn sequence or session
    /// id, and `InvalidImage` for unusable image data
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay::relay::ChatRequest;
    /// use serde_json::json;
    ///
    /// let request = ChatRequest::from_json(json!({
    ///     "messages": [{"role": "user", "content": "Hello"}]
    /// })).unwrap();
    /// assert_eq!(request.messages.len(), 1);
    ///
    /// assert!(ChatRequest::from_json(json!({"messages": "Hello"})).is_err());
    /// ```
    pub fn from_json(value: Value) -> RelayResult<Self> {
        let Value::Object(mut body) = value else {
            return Err(RelayError::InvalidRequest(
                "Request body must be a JSON object".to_string(),
            ));
        };

        let messages = match body.remove("messages") {
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    serde_json::from_value::<ConversationTurn>(item).map_err(|e| {
                        RelayError::InvalidRequest(format!("messages[{}]: {}", index, e))
                    })
                })
                .collect::<RelayResult<Vec<_>>>()?,
            Some(_) => {
                return Err(RelayError::InvalidRequest(
                    "messages must be an array".to_string(),
                ))
            }
            None => return Err(RelayError::InvalidRequest("messages is required".to_string())),
        };

        let image = match body.remove("imageData") {
            None | Some(Value::Null) => None,
            Some(Value::String(data)) if data.is_empty() => None,
            Some(Value::String(data)) => Some(ImagePayload::from_data_url(&data)?),
            Some(_) => {
                return Err(RelayError::InvalidImage(
                    "imageData must be a data URL string".to_string(),
                ))
            }
        };

        let session_id = match body.remove("sessionId") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) if is_valid_session_id(&id) => Some(id),
            Some(_) => {
                return Err(RelayError::InvalidRequest(format!(
                    "sessionId must be 1-{} letters, digits, '-' or '_'",
                    MAX_SESSION_ID_LEN
                )))
            }
        };

        Ok(Self {
            messages,
            image,
            session_id,
        })
    }

    /// Text of the most recent user turn that has any
    fn latest_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .filter(|turn| turn.role == Role::User)
            .find_map(ConversationTurn::text)
    }

    fn has_user_text(&self) -> bool {
        self.latest_user_text().is_some()
    }
}

fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Successful relay result, serialized as the endpoint's response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    /// Model reply text
    pub response: String,
    /// Session to send with the next request (stateful mode only)
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Model request parameters the relay applies to every call
#[derive(Debug, Clone, PartialEq)]
pub struct RelaySettings {
    /// Stateful or stateless relaying
    pub mode: ConversationMode,
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens
    pub max_output_tokens: Option<u32>,
}

impl From<&Config> for RelaySettings {
    fn from(config: &Config) -> Self {
        Self {
            mode: config.conversation.mode,
            model: config.provider.model.clone(),
            temperature: config.provider.temperature,
            max_output_tokens: config.provider.max_output_tokens,
        }
    }
}

/// The relay: validated request in, model reply text out
pub struct ChatRelay {
    client: Arc<dyn ResponsesClient>,
    sessions: SessionStore,
    settings: RelaySettings,
}

impl ChatRelay {
    /// Create a relay
    pub fn new(
        client: Arc<dyn ResponsesClient>,
        sessions: SessionStore,
        settings: RelaySettings,
    ) -> Self {
        Self {
            client,
            sessions,
            settings,
        }
    }

    /// Create a relay with session store and settings taken from config
    pub fn from_config(client: Arc<dyn ResponsesClient>, config: &Config) -> Self {
        Self::new(
            client,
            SessionStore::from_config(&config.conversation),
            RelaySettings::from(config),
        )
    }

    /// Active conversation mode
    pub fn mode(&self) -> ConversationMode {
        self.settings.mode
    }

    /// Session store backing stateful mode
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Relay one chat request to the model
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` when there is nothing to send, and any
    /// error from the model client unchanged
    pub async fn handle(&self, request: ChatRequest) -> RelayResult<ChatReply> {
        match self.settings.mode {
            ConversationMode::Stateless => self.handle_stateless(request).await,
            ConversationMode::Stateful => self.handle_stateful(request).await,
        }
    }

    /// Forget a session context
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` when the session does not exist
    pub async fn reset_session(&self, id: &str) -> RelayResult<()> {
        if self.sessions.remove(id).await {
            tracing::info!("Session {} reset", id);
            Ok(())
        } else {
            Err(RelayError::SessionNotFound(format!(
                "No active session with id {}",
                id
            )))
        }
    }

    async fn handle_stateless(&self, request: ChatRequest) -> RelayResult<ChatReply> {
        let input = build_stateless_input(&request)?;
        let upstream = self.responses_request(input, None, false);

        let reply = self.client.create_response(&upstream).await?;
        tracing::info!("Relayed stateless request, response {}", reply.id);

        Ok(ChatReply {
            response: reply.text,
            session_id: None,
        })
    }

    async fn handle_stateful(&self, request: ChatRequest) -> RelayResult<ChatReply> {
        if !request.has_user_text() && request.image.is_none() {
            return Err(no_content_error());
        }

        let (session_id, handle) = self
            .sessions
            .checkout(request.session_id.as_deref())
            .await;
        let mut context = handle.lock().await;

        let input = build_stateful_input(&request, &context);
        let previous = context.previous_response_id().map(str::to_string);
        let upstream = self.responses_request(input, previous.clone(), true);

        match self.client.create_response(&upstream).await {
            Ok(reply) => {
                context.record_reply(reply.id.clone());
                tracing::info!(
                    "Relayed turn {} of session {}, response {}",
                    context.turns(),
                    session_id,
                    reply.id
                );
                Ok(ChatReply {
                    response: reply.text,
                    session_id: Some(session_id),
                })
            }
            Err(err) => {
                // a 404 while continuing means the stored response is gone upstream
                if previous.is_some() && matches!(err, RelayError::Upstream { status: 404, .. }) {
                    tracing::warn!(
                        "Previous response for session {} no longer exists, starting a new thread",
                        session_id
                    );
                    context.reset();
                }

                // a failed first turn leaves nothing worth keeping, and an
                // anonymous caller never learns the id
                if previous.is_none() {
                    drop(context);
                    self.sessions.discard_unused(&session_id, &handle).await;
                }
                Err(err)
            }
        }
    }

    fn responses_request(
        &self,
        input: Vec<ResponseInputItem>,
        previous_response_id: Option<String>,
        store: bool,
    ) -> ResponsesRequest {
        ResponsesRequest {
            model: self.settings.model.clone(),
            input,
            previous_response_id,
            store,
            temperature: self.settings.temperature,
            max_output_tokens: self.settings.max_output_tokens,
        }
    }
}

fn no_content_error() -> RelayError {
    RelayError::InvalidRequest("Request contains no text or image content".to_string())
}

/// User message content: image first, then text
fn user_content(image: Option<&ImagePayload>, text: Option<&str>) -> Vec<ResponseInputContent> {
    let mut content = Vec::with_capacity(2);
    if let Some(image) = image {
        content.push(ResponseInputContent::InputImage {
            image_url: image.to_data_url(),
        });
    }
    if let Some(text) = text {
        content.push(ResponseInputContent::InputText {
            text: text.to_string(),
        });
    }
    content
}

/// Input for a stateful turn: the latest user text and image, preceded by
/// any system turns when the session has no upstream thread yet
fn build_stateful_input(request: &ChatRequest, context: &SessionContext) -> Vec<ResponseInputItem> {
    let mut input = Vec::new();

    if context.previous_response_id().is_none() {
        input.extend(
            request
                .messages
                .iter()
                .filter(|turn| turn.role == Role::System)
                .filter_map(|turn| turn.text())
                .map(|text| {
                    ResponseInputItem::message(
                        Role::System,
                        vec![ResponseInputContent::InputText {
                            text: text.to_string(),
                        }],
                    )
                }),
        );
    }

    input.push(ResponseInputItem::message(
        Role::User,
        user_content(request.image.as_ref(), request.latest_user_text()),
    ));
    input
}

/// Input for a stateless turn: every non-empty turn in order, with the
/// image attached to the last user message
fn build_stateless_input(request: &ChatRequest) -> RelayResult<Vec<ResponseInputItem>> {
    if !request.has_user_text() && request.image.is_none() {
        return Err(no_content_error());
    }

    let last_user = request
        .messages
        .iter()
        .rposition(|turn| turn.role == Role::User && turn.text().is_some());

    let mut input: Vec<ResponseInputItem> = request
        .messages
        .iter()
        .enumerate()
        .filter_map(|(index, turn)| {
            let text = turn.text()?;
            let content = match turn.role {
                Role::User if Some(index) == last_user => {
                    user_content(request.image.as_ref(), Some(text))
                }
                Role::User | Role::System => vec![ResponseInputContent::InputText {
                    text: text.to_string(),
                }],
                Role::Assistant => vec![ResponseInputContent::OutputText {
                    text: text.to_string(),
                }],
            };
            Some(ResponseInputItem::message(turn.role, content))
        })
        .collect();

    if last_user.is_none() {
        input.push(ResponseInputItem::message(
            Role::User,
            user_content(request.image.as_ref(), None),
        ));
    }

    Ok(input)
}
