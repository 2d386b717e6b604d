//! Provider module for ChatRelay
//!
//! This module contains the model client abstraction, the Responses API
//! wire types, and the OpenAI implementation.

pub mod base;
pub mod openai;

pub use base::{
    ConversationTurn, ModelReply, ResponseInputContent, ResponseInputItem, ResponseOutputContent,
    ResponseOutputItem, ResponsesClient, ResponsesRequest, ResponsesResponse, Role, TokenUsage,
};
pub use openai::OpenAiClient;

#[cfg(test)]
pub use base::MockResponsesClient;
