//! OpenAI-compatible chat-completions client.
//!
//! `OpenAiCompletion` sends one `system` + `user` exchange per completion and
//! reads the first choice's text. Request building, response parsing and
//! status mapping are plain functions so they can be tested without a server.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use handoff_contracts::{
    completion::CompletionRequest,
    error::{CompletionError, TriageError, TriageResult},
};
use handoff_core::CompletionService;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API root without the trailing `/chat/completions`.
    pub base_url: String,
    pub model: String,
    /// Sent as a bearer token when present. Local servers often need none.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl OpenAiConfig {
    /// Full URL of the chat-completions endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Completion service backed by an OpenAI-compatible chat-completions API.
///
/// One request per completion. No retries, no streaming.
pub struct OpenAiCompletion {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiCompletion {
    /// Build the HTTP client. Fails with `ConfigError` on an unusable config.
    pub fn new(config: OpenAiConfig) -> TriageResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(TriageError::ConfigError {
                reason: "base_url must not be empty".to_string(),
            });
        }
        if config.model.trim().is_empty() {
            return Err(TriageError::ConfigError {
                reason: "model must not be empty".to_string(),
            });
        }
        if config.timeout_secs == 0 {
            return Err(TriageError::ConfigError {
                reason: "timeout_secs must be at least 1".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TriageError::ConfigError {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let body = build_chat_request(&self.config.model, &request);
        let endpoint = self.config.endpoint();
        debug!(endpoint = %endpoint, model = %self.config.model, "posting chat completion");

        let mut call = self.client.post(&endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            call = call.bearer_auth(key);
        }

        let response = call.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            // Auth failures may echo key fragments; never surface the body.
            let message = if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                format!("authentication failed (HTTP {})", status.as_u16())
            } else {
                response
                    .text()
                    .await
                    .unwrap_or_else(|e| format!("<body read error: {e}>"))
            };
            warn!(status = status.as_u16(), "chat completion rejected");
            return Err(status_error(status, message));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;
        into_text(chat)
    }
}

// ── Wire format ──────────────────────────────────────────────────────────────

fn build_chat_request(model: &str, request: &CompletionRequest) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [
            { "role": "system", "content": request.system },
            { "role": "user", "content": request.user },
        ],
    })
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

fn into_text(chat: ChatResponse) -> Result<String, CompletionError> {
    let choice = chat
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::Malformed("empty choices array in response".into()))?;

    choice
        .message
        .content
        .ok_or_else(|| CompletionError::Malformed("choice carries no message content".into()))
}

fn status_error(status: StatusCode, message: String) -> CompletionError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        CompletionError::Quota(message)
    } else {
        CompletionError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

fn transport_error(e: reqwest::Error) -> CompletionError {
    if e.is_timeout() {
        CompletionError::Timeout
    } else {
        CompletionError::Transport(e.to_string())
    }
}
