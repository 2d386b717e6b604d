//! Base client trait and common types for ChatRelay
//!
//! This module defines the `ResponsesClient` trait the relay talks to,
//! the conversation turn types received from the browser, and the wire
//! types of the Responses API request and reply.

use crate::error::RelayResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the person using the UI
    User,
    /// Earlier model reply
    Assistant,
    /// Instructions for the model
    System,
}

impl Role {
    /// Role name as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// A single turn of the conversation as sent by the browser
///
/// Content may be missing or null, in which case the turn carries no text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who produced the turn
    pub role: Role,
    /// Plain text of the turn
    #[serde(default)]
    pub content: Option<String>,
}

impl ConversationTurn {
    /// Creates a new user turn
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay::providers::{ConversationTurn, Role};
    ///
    /// let turn = ConversationTurn::user("What is in this salad?");
    /// assert_eq!(turn.role, Role::User);
    /// assert_eq!(turn.text(), Some("What is in this salad?"));
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
        }
    }

    /// Creates a new assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
        }
    }

    /// Creates a new system turn
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
        }
    }

    /// Text of the turn, or `None` when it is missing or empty
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

/// Token usage reported by the model API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the input
    #[serde(default)]
    pub input_tokens: usize,
    /// Tokens generated
    #[serde(default)]
    pub output_tokens: usize,
    /// Total tokens (input + output)
    #[serde(default)]
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay::providers::TokenUsage;
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(input_tokens: usize, output_tokens: usize) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// The part of a model reply the relay uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    /// Upstream response identifier, usable as `previous_response_id`
    pub id: String,
    /// First textual content item of the reply
    pub text: String,
    /// Token usage, when reported
    pub usage: Option<TokenUsage>,
}

// ============================================================================
// RESPONSES ENDPOINT TYPES
// ============================================================================

/// Request structure for the /responses endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsesRequest {
    /// Model identifier (e.g., "gpt-4o")
    pub model: String,

    /// Input items
    pub input: Vec<ResponseInputItem>,

    /// Continue the remote conversation that produced this response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,

    /// Keep the response upstream so it can be continued later
    pub store: bool,

    /// Temperature for sampling (0.0 to 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Upper bound on generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Input item for the responses endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseInputItem {
    /// Message with role and multi-part content
    Message {
        role: String,
        content: Vec<ResponseInputContent>,
    },
}

impl ResponseInputItem {
    /// Build a message item
    pub fn message(role: Role, content: Vec<ResponseInputContent>) -> Self {
        Self::Message {
            role: role.as_str().to_string(),
            content,
        }
    }
}

/// Content parts of an input message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseInputContent {
    /// Text from the user or system
    InputText { text: String },
    /// Earlier assistant output
    OutputText { text: String },
    /// Image given as a data URL
    InputImage { image_url: String },
}

/// Reply from the responses endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesResponse {
    /// Response identifier
    pub id: String,
    /// Output items, in order
    #[serde(default)]
    pub output: Vec<ResponseOutputItem>,
    /// Token usage
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// Output item of a reply
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseOutputItem {
    /// Assistant message
    Message {
        #[serde(default)]
        content: Vec<ResponseOutputContent>,
    },
    /// Reasoning summaries, tool calls and anything newer
    #[serde(other)]
    Other,
}

/// Content part of an output message
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseOutputContent {
    /// Generated text
    OutputText { text: String },
    /// Model declined to answer
    Refusal { refusal: String },
    /// Anything else
    #[serde(other)]
    Other,
}

impl ResponsesResponse {
    /// First textual content item across the message output items
    pub fn first_text(&self) -> Option<&str> {
        self.output
            .iter()
            .filter_map(|item| match item {
                ResponseOutputItem::Message { content } => Some(content),
                ResponseOutputItem::Other => None,
            })
            .flatten()
            .find_map(|part| match part {
                ResponseOutputContent::OutputText { text } => Some(text.as_str()),
                ResponseOutputContent::Refusal { refusal } => Some(refusal.as_str()),
                ResponseOutputContent::Other => None,
            })
    }
}

/// Client for a Responses-API compatible model service
///
/// Implementors encapsulate transport, credentials and error
/// classification; the relay only sees [`ModelReply`] or a
/// [`crate::error::RelayError`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResponsesClient: Send + Sync {
    /// Create a response and extract its first textual content item
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` when no key is configured, a
    /// classified upstream error on non-success statuses, and
    /// `InvalidResponse` when the reply has no text
    async fn create_response(&self, request: &ResponsesRequest) -> RelayResult<ModelReply>;

    /// Delete a response stored upstream
    async fn delete_response(&self, response_id: &str) -> RelayResult<()>;
}
