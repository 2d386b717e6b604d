//! Configuration management for ChatRelay
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::cli::{Cli, Commands};
use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for ChatRelay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Model API settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Conversation continuity settings
    #[serde(default)]
    pub conversation: ConversationConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the pre-built UI bundle
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Maximum accepted request body size (bytes)
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// Allow cross-origin requests from any origin
    #[serde(default = "default_cors_permissive")]
    pub cors_permissive: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_body_limit() -> usize {
    50 * 1024 * 1024 // 50 MB, base64 camera snapshots are large
}

fn default_cors_permissive() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            body_limit_bytes: default_body_limit(),
            cors_permissive: default_cors_permissive(),
        }
    }
}

/// Model API provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the Responses API (useful for tests and local mocks)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// API key, normally supplied through `OPENAI_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Sampling temperature (0.0 to 2.0)
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Upper bound on generated tokens
    #[serde(default)]
    pub max_output_tokens: Option<u32>,

    /// Request timeout for model API calls (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key: None,
            temperature: None,
            max_output_tokens: None,
            timeout_seconds: default_timeout(),
        }
    }
}

/// How follow-up requests relate to earlier ones
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationMode {
    /// Chain requests through the upstream previous response id; only the
    /// latest user turn is forwarded
    #[default]
    Stateful,
    /// Forward the client's full turn sequence on every request and keep
    /// nothing upstream
    Stateless,
}

impl std::str::FromStr for ConversationMode {
    type Err = RelayError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stateful" => Ok(Self::Stateful),
            "stateless" => Ok(Self::Stateless),
            other => Err(RelayError::Config(format!(
                "Invalid conversation mode: {}. Must be one of: stateful, stateless",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ConversationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stateful => write!(f, "stateful"),
            Self::Stateless => write!(f, "stateless"),
        }
    }
}

/// Conversation continuity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Stateful or stateless relaying
    #[serde(default)]
    pub mode: ConversationMode,

    /// Idle time after which a session context is discarded (seconds)
    #[serde(default = "default_session_ttl")]
    pub session_ttl_seconds: u64,

    /// Maximum number of live session contexts
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_session_ttl() -> u64 {
    3600
}

fn default_max_sessions() -> usize {
    1000
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            mode: ConversationMode::default(),
            session_ttl_seconds: default_session_ttl(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| RelayError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            if !api_key.trim().is_empty() {
                self.provider.api_key = Some(api_key);
            }
        }

        if let Ok(api_base) = std::env::var("CHATRELAY_API_BASE") {
            self.provider.api_base = api_base;
        }

        if let Ok(model) = std::env::var("CHATRELAY_MODEL") {
            self.provider.model = model;
        }

        if let Ok(host) = std::env::var("CHATRELAY_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("CHATRELAY_PORT") {
            if let Ok(value) = port.parse() {
                self.server.port = value;
            } else {
                tracing::warn!("Invalid CHATRELAY_PORT: {}", port);
            }
        }

        if let Ok(static_dir) = std::env::var("CHATRELAY_STATIC_DIR") {
            self.server.static_dir = PathBuf::from(static_dir);
        }

        if let Ok(limit) = std::env::var("CHATRELAY_BODY_LIMIT_BYTES") {
            if let Ok(value) = limit.parse() {
                self.server.body_limit_bytes = value;
            } else {
                tracing::warn!("Invalid CHATRELAY_BODY_LIMIT_BYTES: {}", limit);
            }
        }

        if let Ok(mode) = std::env::var("CHATRELAY_CONVERSATION_MODE") {
            match mode.parse() {
                Ok(value) => self.conversation.mode = value,
                Err(_) => {
                    tracing::warn!(
                        "Invalid conversation mode: {}, using {}",
                        mode,
                        self.conversation.mode
                    );
                }
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Commands::Serve {
            host,
            port,
            static_dir,
            mode,
        } = &cli.command
        {
            if let Some(host) = host {
                self.server.host = host.clone();
            }
            if let Some(port) = port {
                self.server.port = *port;
            }
            if let Some(dir) = static_dir {
                self.server.static_dir = dir.clone();
            }
            if let Some(mode) = mode {
                self.conversation.mode = *mode;
            }
        }
    }

    /// Whether an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.provider
            .api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges.
    /// A missing API key is not a validation failure; the server starts
    /// and reports a configuration error on each chat request instead.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(RelayError::Config("port must be greater than 0".to_string()).into());
        }

        if self.server.body_limit_bytes == 0 {
            return Err(
                RelayError::Config("body_limit_bytes must be greater than 0".to_string()).into(),
            );
        }

        if self.provider.model.trim().is_empty() {
            return Err(RelayError::Config("Model cannot be empty".to_string()).into());
        }

        match url::Url::parse(&self.provider.api_base) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
            Ok(parsed) => {
                return Err(RelayError::Config(format!(
                    "api_base must use http or https, got {}",
                    parsed.scheme()
                ))
                .into());
            }
            Err(e) => {
                return Err(RelayError::Config(format!(
                    "Invalid api_base {}: {}",
                    self.provider.api_base, e
                ))
                .into());
            }
        }

        if let Some(temperature) = self.provider.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(RelayError::Config(
                    "temperature must be between 0.0 and 2.0".to_string(),
                )
                .into());
            }
        }

        if self.provider.max_output_tokens == Some(0) {
            return Err(RelayError::Config(
                "max_output_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if self.provider.timeout_seconds == 0 {
            return Err(
                RelayError::Config("timeout_seconds must be greater than 0".to_string()).into(),
            );
        }

        if self.conversation.session_ttl_seconds == 0 {
            return Err(RelayError::Config(
                "session_ttl_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.conversation.max_sessions == 0 {
            return Err(
                RelayError::Config("max_sessions must be greater than 0".to_string()).into(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serial_test::serial;

    fn serve_cli(args: &[&str]) -> Cli {
        let mut full = vec!["chatrelay", "serve"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.static_dir, PathBuf::from("dist"));
        assert_eq!(config.server.body_limit_bytes, 52_428_800);
        assert_eq!(config.provider.model, "gpt-4o");
        assert_eq!(config.provider.api_base, "https://api.openai.com/v1");
        assert_eq!(config.conversation.mode, ConversationMode::Stateful);
    }

    #[test]
    fn test_config_validation_success() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_is_not_a_validation_error() {
        let mut config = Config::default();
        config.provider.api_key = None;
        assert!(config.validate().is_ok());
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_config_validation_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_model() {
        let mut config = Config::default();
        config.provider.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_api_base() {
        let mut config = Config::default();
        config.provider.api_base = "not a url".to_string();
        assert!(config.validate().is_err());

        config.provider.api_base = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_temperature_range() {
        let mut config = Config::default();
        config.provider.temperature = Some(2.5);
        assert!(config.validate().is_err());

        config.provider.temperature = Some(0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_max_output_tokens() {
        let mut config = Config::default();
        config.provider.max_output_tokens = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_sessions() {
        let mut config = Config::default();
        config.conversation.max_sessions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
server:
  port: 8080
  static_dir: public
provider:
  model: gpt-4o-mini
  temperature: 0.7
  max_output_tokens: 150
conversation:
  mode: stateless
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.static_dir, PathBuf::from("public"));
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.provider.temperature, Some(0.7));
        assert_eq!(config.provider.max_output_tokens, Some(150));
        assert_eq!(config.conversation.mode, ConversationMode::Stateless);
        assert_eq!(config.conversation.session_ttl_seconds, 3600);
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let mut config = Config::default();
        config.provider.api_key = Some("sk-secret".to_string());
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("sk-secret"));
    }

    #[test]
    fn test_conversation_mode_from_str() {
        assert_eq!(
            "Stateless".parse::<ConversationMode>().unwrap(),
            ConversationMode::Stateless
        );
        assert_eq!(
            "stateful".parse::<ConversationMode>().unwrap(),
            ConversationMode::Stateful
        );
        assert!("sometimes".parse::<ConversationMode>().is_err());
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        std::env::remove_var("OPENAI_API_KEY");
        let cli = serve_cli(&[]);
        let config = Config::load("/nonexistent/chatrelay.yaml", &cli).unwrap();
        assert_eq!(config.server.port, 3001);
        assert!(!config.has_api_key());
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_overrides() {
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("CHATRELAY_PORT", "9000");
        std::env::set_var("CHATRELAY_MODEL", "gpt-4o-mini");
        std::env::set_var("CHATRELAY_CONVERSATION_MODE", "stateless");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("CHATRELAY_PORT");
        std::env::remove_var("CHATRELAY_MODEL");
        std::env::remove_var("CHATRELAY_CONVERSATION_MODE");

        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.conversation.mode, ConversationMode::Stateless);
    }

    #[test]
    #[serial]
    fn test_invalid_env_port_is_ignored() {
        std::env::set_var("CHATRELAY_PORT", "not-a-port");
        let mut config = Config::default();
        config.apply_env_vars();
        std::env::remove_var("CHATRELAY_PORT");

        assert_eq!(config.server.port, 3001);
    }

    #[test]
    #[serial]
    fn test_invalid_env_mode_is_ignored() {
        std::env::set_var("CHATRELAY_CONVERSATION_MODE", "sometimes");
        let mut config = Config::default();
        config.apply_env_vars();
        std::env::remove_var("CHATRELAY_CONVERSATION_MODE");

        assert_eq!(config.conversation.mode, ConversationMode::Stateful);
    }

    #[test]
    #[serial]
    fn test_blank_api_key_env_is_ignored() {
        std::env::set_var("OPENAI_API_KEY", "   ");
        let mut config = Config::default();
        config.apply_env_vars();
        std::env::remove_var("OPENAI_API_KEY");

        assert!(!config.has_api_key());
    }

    #[test]
    fn test_cli_overrides_win() {
        let cli = serve_cli(&["--port", "4000", "--mode", "stateless", "--static-dir", "ui"]);
        let mut config = Config::default();
        config.apply_cli_overrides(&cli);
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.static_dir, PathBuf::from("ui"));
        assert_eq!(config.conversation.mode, ConversationMode::Stateless);
    }
}
