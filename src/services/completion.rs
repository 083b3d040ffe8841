use crate::config::Config;
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 15;

/// The hosted language model behind the pipeline. One call per request, no
/// retries at this layer; transport and auth failures propagate to the caller.
#[async_trait]
pub trait CompletionBackend {
    /// Send the (system, user) instruction pair and return the raw text
    /// payload the model produced.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct OpenAiCompletion {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: Value,
    messages: Vec<ChatMessage<'a>>,
}

impl OpenAiCompletion {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| ApiError::InternalError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.openai_api_key.clone(),
            endpoint: format!("{}/v1/chat/completions", config.openai_base_url),
            model: config.chat_model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiCompletion {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        // The json_object response format keeps the payload machine-parsable;
        // the low temperature keeps runs consistent without freezing variety.
        let request = ChatCompletionRequest {
            model: &self.model,
            temperature: self.temperature,
            response_format: serde_json::json!({"type": "json_object"}),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        debug!(model = %self.model, "Requesting chat completion");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::ModelError(format!("Completion request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::ModelError(format!("Failed to read completion body: {e}")))?;

        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => ApiError::ModelError(
                    "Authentication failed. Check the completion API key.".to_string(),
                ),
                429 => ApiError::ModelError(
                    "Rate limit exceeded on the completion endpoint.".to_string(),
                ),
                _ => ApiError::ModelError(format!(
                    "Completion endpoint returned {status}: {body}"
                )),
            });
        }

        extract_message_content(&body)
    }
}

/// Pull `choices[0].message.content` out of a chat-completions response body.
fn extract_message_content(body: &str) -> Result<String> {
    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::ModelError(format!("Completion response was not JSON: {e}")))?;

    parsed
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ApiError::ModelError("Completion response carried no message content".to_string())
        })
}
