//! Command-line interface definition for ChatRelay
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for running the relay server and maintaining
//! responses stored on the model API.

use crate::config::ConversationMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ChatRelay - web chat relay for a model API
///
/// Serves a browser chat UI and forwards its text and image messages
/// to the configured model.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatrelay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for ChatRelay
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the relay HTTP server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory with the pre-built UI bundle (overrides config)
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Conversation mode: stateful or stateless
        #[arg(short, long)]
        mode: Option<ConversationMode>,
    },

    /// Delete a response stored on the model API
    DeleteResponse {
        /// Identifier of the stored response (e.g. resp_abc123)
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            command: Commands::Serve {
                host: None,
                port: None,
                static_dir: None,
                mode: None,
            },
        }
    }
}
