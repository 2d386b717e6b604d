//! ChatRelay - HTTP relay between a chat UI and the OpenAI Responses API
//!
//! This library provides the core functionality for the ChatRelay server,
//! including request validation, image normalization, per-session
//! conversation continuity, the model client and the HTTP surface.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `relay`: Request validation and the relay call (stateful or stateless)
//! - `session`: Per-session continuation pointers with expiry
//! - `image`: Data URL normalization for attached images
//! - `providers`: Responses API client abstraction and OpenAI implementation
//! - `server`: axum router, handlers and error rendering
//! - `config`: Configuration management and validation
//! - `error`: Error types, categories and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use chatrelay::config::Config;
//! use chatrelay::providers::OpenAiClient;
//! use chatrelay::relay::ChatRelay;
//! use chatrelay::server::{build_router, AppState};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let client = OpenAiClient::new(&config.provider)?;
//!     let relay = ChatRelay::from_config(Arc::new(client), &config);
//!     let _app = build_router(AppState::new(relay), &config);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod image;
pub mod providers;
pub mod relay;
pub mod server;
pub mod session;

// Re-export commonly used types
pub use config::{Config, ConversationMode};
pub use error::{RelayError, RelayResult, Result};
pub use relay::{ChatRelay, ChatReply, ChatRequest};
pub use session::{SessionContext, SessionStore};
