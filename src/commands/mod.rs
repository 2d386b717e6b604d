/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes two top-level command modules:

- `serve`     Run the HTTP relay
- `responses` Maintenance of responses stored upstream
*/

use crate::config::Config;
use crate::error::Result;

// Relay server command handler
pub mod serve {
    //! Server command handler.
    //!
    //! Hands the loaded configuration to the HTTP server and blocks until
    //! the server shuts down.

    use super::*;

    /// Run the relay server
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to start
    pub async fn run_serve(config: Config) -> Result<()> {
        tracing::info!(
            "Starting relay on {}:{} with model {}",
            config.server.host,
            config.server.port,
            config.provider.model
        );
        crate::server::serve(config).await
    }
}

// Stored response maintenance
pub mod responses {
    //! Deletes responses stored on the model service.
    //!
    //! Stateful conversations keep every reply upstream. This command
    //! removes one by id when it should no longer be retained.

    use super::*;
    use crate::providers::{OpenAiClient, ResponsesClient};
    use colored::Colorize;

    /// Delete a stored response
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration
    /// * `response_id` - Upstream response id, e.g. `resp_abc123`
    ///
    /// # Errors
    ///
    /// Returns error if no API key is configured or the service rejects
    /// the deletion
    pub async fn delete_response(config: &Config, response_id: &str) -> Result<()> {
        let client = OpenAiClient::new(&config.provider)?;
        client.delete_response(response_id).await?;
        println!("{} {}", "Deleted response".green(), response_id.bold());
        Ok(())
    }
}
