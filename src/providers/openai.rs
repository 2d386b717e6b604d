//! OpenAI Responses API client for ChatRelay
//!
//! Sends relay requests to `POST {api_base}/responses`, extracts the reply
//! text, and classifies upstream failures into the relay's error
//! categories. No retries are attempted; every failure surfaces at once.

use crate::config::ProviderConfig;
use crate::error::{RelayError, RelayResult, Result};
use crate::providers::{ModelReply, ResponsesClient, ResponsesRequest, ResponsesResponse};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Error envelope returned by the API on non-success statuses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    param: Option<String>,
}

/// Map a non-success upstream status and body to a relay error
///
/// 401/403 are credential problems and 429 is a rate limit. A 404, or an
/// error whose code is `model_not_found` or that points at the `model`
/// parameter, means the configured model cannot be used, except a 404 for
/// a missing `previous_response_id`, which stays an upstream error so the
/// relay can restart the thread. Everything else is generic.
fn classify_api_error(status: StatusCode, body: &str) -> RelayError {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_default();
    let message = detail
        .message
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));

    let model_related = detail.code.as_deref() == Some("model_not_found")
        || detail.param.as_deref() == Some("model");

    let previous_missing = detail.param.as_deref() == Some("previous_response_id")
        || message.starts_with("Previous response");

    match status.as_u16() {
        401 | 403 if !model_related => RelayError::Authentication(message),
        429 => RelayError::RateLimited(message),
        404 if previous_missing => RelayError::Upstream {
            status: 404,
            message,
        },
        404 => RelayError::ModelUnavailable(message),
        _ if model_related => RelayError::ModelUnavailable(message),
        _ if detail.code.as_deref() == Some("invalid_api_key") => {
            RelayError::Authentication(message)
        }
        _ => {
            if let Some(kind) = detail.kind {
                tracing::debug!(error_type = %kind, "Unclassified model API error");
            }
            RelayError::Upstream {
                status: status.as_u16(),
                message,
            }
        }
    }
}

/// Response ids are used as a URL path segment
fn is_valid_response_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Responses API client
///
/// # Examples
///
/// ```
/// use chatrelay::config::ProviderConfig;
/// use chatrelay::providers::OpenAiClient;
///
/// let client = OpenAiClient::new(&ProviderConfig::default());
/// assert!(client.is_ok());
/// ```
pub struct OpenAiClient {
    client: Client,
    api_base: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    /// Create a new client from provider configuration
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("chatrelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RelayError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized model API client: base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty()),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    fn api_key(&self) -> RelayResult<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            RelayError::MissingCredentials("OpenAI API key is missing".to_string())
        })
    }
}

#[async_trait]
impl ResponsesClient for OpenAiClient {
    async fn create_response(&self, request: &ResponsesRequest) -> RelayResult<ModelReply> {
        let key = self.api_key()?;

        tracing::debug!(
            "Sending responses request: {} input items, continuing={}",
            request.input.len(),
            request.previous_response_id.is_some()
        );

        let response = self
            .client
            .post(self.endpoint("responses"))
            .bearer_auth(key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Model API request failed: {}", e);
                RelayError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Model API returned error {}: {}", status, error_text);
            return Err(classify_api_error(status, &error_text));
        }

        let parsed: ResponsesResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse model API response: {}", e);
            RelayError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        let text = parsed
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| {
                tracing::error!("Model API response {} has no text content", parsed.id);
                RelayError::InvalidResponse("Reply contains no text content".to_string())
            })?;

        if let Some(usage) = parsed.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Received response {}",
                parsed.id
            );
        }

        Ok(ModelReply {
            id: parsed.id,
            text,
            usage: parsed.usage,
        })
    }

    async fn delete_response(&self, response_id: &str) -> RelayResult<()> {
        if !is_valid_response_id(response_id) {
            return Err(RelayError::InvalidRequest(format!(
                "Invalid response id: {}",
                response_id
            )));
        }
        let key = self.api_key()?;

        let response = self
            .client
            .delete(self.endpoint(&format!("responses/{}", response_id)))
            .bearer_auth(key)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RelayError::Upstream {
                status: 404,
                message: format!("Response {} not found", response_id),
            });
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Deleting response {} failed {}: {}", response_id, status, error_text);
            return Err(classify_api_error(status, &error_text));
        }

        tracing::info!("Deleted stored response {}", response_id);
        Ok(())
    }
}
