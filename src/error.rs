//! Error types for ChatRelay
//!
//! This module defines the error taxonomy used on the request path and the
//! mapping from each error onto a user-facing category, using `thiserror`
//! for ergonomic error handling.

use thiserror::Error;

/// Details shown to clients for any credential problem
const CONFIGURATION_DETAILS: &str = "API key is missing or invalid";
/// Details shown to clients when the upstream rate limit is hit
const RATE_LIMIT_DETAILS: &str = "Please try again in a few moments";
/// Details shown to clients when the configured model cannot be used
const MODEL_DETAILS: &str =
    "The specified model is not available. Please check your account access.";

/// Main error type for ChatRelay operations
///
/// Covers request validation, image normalization, upstream model API
/// failures, session lookups and configuration problems. Every variant
/// maps onto exactly one [`ErrorCategory`].
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request body is not valid JSON
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// Request body exceeds the configured size limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// The turn sequence is missing, not a list, or contains malformed turns
    #[error("Invalid messages format: {0}")]
    InvalidRequest(String),

    /// Image payload could not be normalized
    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    /// No API credential is configured
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Upstream rejected the credential (401/403)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Upstream returned 429
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Upstream reports the configured model as unknown or inaccessible
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Any other non-success upstream status
    #[error("Upstream error ({status}): {message}")]
    Upstream {
        /// HTTP status returned by the model API
        status: u16,
        /// Error message extracted from the response body
        message: String,
    },

    /// Upstream replied with success but the body had no usable text
    #[error("Invalid response from model API: {0}")]
    InvalidResponse(String),

    /// Session id is unknown to the session store
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// User-facing error category
///
/// Categories decide the HTTP status a client sees. The browser UI shows
/// a generic apology for all of them; the category is for API consumers
/// and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Client sent something the relay cannot use (400)
    InvalidRequest,
    /// Body over the configured limit (413)
    PayloadTooLarge,
    /// Missing or rejected credential (500)
    Configuration,
    /// Upstream rate limit (429)
    RateLimit,
    /// Configured model not available (400)
    ModelUnavailable,
    /// Unknown resource (404)
    NotFound,
    /// Anything else (500)
    Generic,
}

impl ErrorCategory {
    /// HTTP status code for this category
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay::error::ErrorCategory;
    ///
    /// assert_eq!(ErrorCategory::RateLimit.status_code(), 429);
    /// assert_eq!(ErrorCategory::Configuration.status_code(), 500);
    /// ```
    pub fn status_code(self) -> u16 {
        match self {
            Self::InvalidRequest | Self::ModelUnavailable => 400,
            Self::PayloadTooLarge => 413,
            Self::RateLimit => 429,
            Self::NotFound => 404,
            Self::Configuration | Self::Generic => 500,
        }
    }
}

impl RelayError {
    /// Category this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedBody(_) | Self::InvalidRequest(_) | Self::InvalidImage(_) => {
                ErrorCategory::InvalidRequest
            }
            Self::PayloadTooLarge(_) => ErrorCategory::PayloadTooLarge,
            Self::MissingCredentials(_) | Self::Authentication(_) => ErrorCategory::Configuration,
            Self::RateLimited(_) => ErrorCategory::RateLimit,
            Self::ModelUnavailable(_) => ErrorCategory::ModelUnavailable,
            Self::SessionNotFound(_) => ErrorCategory::NotFound,
            Self::Config(_)
            | Self::Upstream { .. }
            | Self::InvalidResponse(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Yaml(_)
            | Self::Http(_) => ErrorCategory::Generic,
        }
    }

    /// Short error label returned to clients in the `error` field
    pub fn public_error(&self) -> &'static str {
        match self {
            Self::MalformedBody(_) => "Invalid request body",
            Self::PayloadTooLarge(_) => "Payload too large",
            Self::InvalidRequest(_) => "Invalid messages format",
            Self::InvalidImage(_) => "Invalid image data",
            Self::SessionNotFound(_) => "Session not found",
            _ => match self.category() {
                ErrorCategory::Configuration => "Configuration error",
                ErrorCategory::RateLimit => "Rate limit exceeded",
                ErrorCategory::ModelUnavailable => "Model error",
                _ => "Error processing your request",
            },
        }
    }

    /// Explanation returned to clients in the `details` field
    ///
    /// Credential, rate-limit and model errors use fixed wording so that
    /// upstream error bodies never leak to the browser.
    pub fn public_details(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => CONFIGURATION_DETAILS.to_string(),
            ErrorCategory::RateLimit => RATE_LIMIT_DETAILS.to_string(),
            ErrorCategory::ModelUnavailable => MODEL_DETAILS.to_string(),
            _ => match self {
                Self::MalformedBody(msg)
                | Self::PayloadTooLarge(msg)
                | Self::InvalidRequest(msg)
                | Self::InvalidImage(msg)
                | Self::SessionNotFound(msg) => msg.clone(),
                other => other.to_string(),
            },
        }
    }
}

/// Result type alias for startup and CLI operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Result type alias for the request path, where the typed error decides
/// the HTTP response
pub type RelayResult<T> = std::result::Result<T, RelayError>;
