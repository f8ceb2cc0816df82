use async_trait::async_trait;
use reqwest::Client;

use crate::core::config::{ConfigService, LlmSettings};
use crate::core::errors::ApiError;
use crate::llm::anthropic::AnthropicProvider;
use crate::llm::provider::LlmProvider;
use crate::llm::types::ChatRequest;

/// Provider backed by the live configuration.
///
/// Settings are re-read on every call, so a key or model saved through
/// `PATCH /api/config` takes effect without a restart.
#[derive(Clone)]
pub struct LlmService {
    client: Client,
    config: ConfigService,
}

impl LlmService {
    pub fn new(config: ConfigService) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn resolve_provider(&self) -> Result<(AnthropicProvider, LlmSettings), ApiError> {
        let settings = self.config.settings()?;
        let Some(api_key) = settings.llm.api_key.clone() else {
            tracing::warn!("LLM API key is not configured");
            return Err(ApiError::ServiceUnavailable);
        };

        let provider = AnthropicProvider::new(self.client.clone(), &settings.llm, api_key);
        Ok((provider, settings.llm))
    }
}

#[async_trait]
impl LlmProvider for LlmService {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let (provider, settings) = self.resolve_provider()?;
        provider.chat(request.with_settings(&settings)).await
    }
}
