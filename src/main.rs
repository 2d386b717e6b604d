//! ChatRelay - HTTP relay between a chat UI and the OpenAI Responses API
//!
#![doc = "ChatRelay - HTTP relay between a chat UI and the OpenAI Responses API"]
#![doc = "Main entry point for the ChatRelay server."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatrelay::cli::{Cli, Commands};
use chatrelay::commands;
use chatrelay::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!("Starting relay server");
            commands::serve::run_serve(config).await?;
            Ok(())
        }
        Commands::DeleteResponse { id } => {
            tracing::info!("Deleting stored response {}", id);
            commands::responses::delete_response(&config, &id).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool, json_logs: bool) {
    let default_filter = if verbose {
        "chatrelay=debug,tower_http=debug"
    } else {
        "chatrelay=info,tower_http=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
