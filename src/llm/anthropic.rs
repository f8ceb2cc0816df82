use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::{ChatMessage, ChatRequest};
use crate::core::config::LlmSettings;
use crate::core::errors::ApiError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone)]
pub struct AnthropicProvider {
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(client: Client, settings: &LlmSettings, api_key: impl Into<String>) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(settings.timeout_secs),
            client,
        }
    }

    fn request_body(&self, request: &ChatRequest) -> Value {
        let messages: Vec<&ChatMessage> = request.conversation().collect();
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": request.max_tokens.unwrap_or(1024),
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(system) = request.system_prompt() {
                obj.insert("system".to_string(), json!(system));
            }
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
        }

        body
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.request_body(&request);

        let res = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ApiError::ServiceUnavailable
                } else {
                    ApiError::internal(err)
                }
            })?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            tracing::warn!("LLM request failed with {}: {}", status, text);
            return Err(ApiError::Internal(format!(
                "Failed to generate answer (upstream status {})",
                status
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;
        read_answer(&payload)
    }
}

fn read_answer(payload: &Value) -> Result<String, ApiError> {
    extract_text(payload).ok_or_else(|| {
        tracing::warn!("Unexpected LLM response structure: {}", payload);
        ApiError::Internal("Unexpected API response format".to_string())
    })
}

/// Pull the generated text out of a Messages response, accepting the
/// chat-completions shape as well.
fn extract_text(payload: &Value) -> Option<String> {
    payload["content"][0]["text"]
        .as_str()
        .or_else(|| payload["choices"][0]["message"]["content"].as_str())
        .map(str::to_string)
}
