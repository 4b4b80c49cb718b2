//! Google Gemini provider implementation

use async_trait::async_trait;
use prism_config::ProviderConfig;
use prism_telemetry::Reporter;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::google_common;
use super::{ChunkStream, Provider};
use crate::convert::google::build_google_request;
use crate::error::LlmError;
use crate::types::{CallMetadata, Message, ModelInfo, PromptOptions, ResolvedModel, Role};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

fn models() -> Vec<(&'static str, ModelInfo)> {
    vec![
        (
            "gemini-2.5-flash",
            ModelInfo {
                max_tokens: Some(65_536),
                context_window: 1_048_576,
                supports_images: true,
                supports_prompt_cache: true,
                input_price: Some(0.3),
                output_price: Some(2.5),
                cache_reads_price: Some(0.075),
                ..ModelInfo::default()
            },
        ),
        (
            // Prompts beyond 200k tokens bill at the higher base rate
            "gemini-2.5-pro",
            ModelInfo {
                max_tokens: Some(65_536),
                context_window: 1_048_576,
                supports_images: true,
                supports_prompt_cache: true,
                input_price: Some(2.5),
                output_price: Some(15.0),
                cache_reads_price: Some(0.625),
                tiers: vec![crate::types::PriceTier {
                    context_window: 200_000,
                    input_price: Some(1.25),
                    output_price: Some(10.0),
                    cache_reads_price: Some(0.31),
                    cache_writes_price: None,
                }],
                ..ModelInfo::default()
            },
        ),
        (
            "gemini-2.0-flash-001",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 1_048_576,
                supports_images: true,
                supports_prompt_cache: true,
                input_price: Some(0.1),
                output_price: Some(0.4),
                cache_reads_price: Some(0.025),
                ..ModelInfo::default()
            },
        ),
    ]
}

/// Gemini Generative Language API handler
pub struct GeminiProvider {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    model: ResolvedModel,
    reporter: Reporter,
}

impl GeminiProvider {
    /// Create from provider configuration
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (should never
    /// happen).
    pub fn new(config: &ProviderConfig, reporter: Reporter) -> Self {
        let model = ResolvedModel::resolve(config.model.as_deref(), DEFAULT_MODEL, &models());
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL).expect("valid default URL"));

        Self {
            client: Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            temperature: config.temperature.or(model.info.default_temperature),
            max_tokens: config.max_tokens.or(model.info.max_tokens),
            model,
            reporter,
        }
    }

    /// Build the `generateContent` endpoint URL
    fn generate_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/models/{}:generateContent", self.model.id)
    }

    /// Build the `streamGenerateContent` endpoint URL
    fn stream_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/models/{}:streamGenerateContent?alt=sse", self.model.id)
    }

    /// Attach the API key header when one is configured
    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("x-goog-api-key", key.expose_secret()),
            None => builder,
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    fn model(&self) -> ResolvedModel {
        self.model.clone()
    }

    async fn create_message(
        &self,
        system: &str,
        messages: &[Message],
        metadata: &CallMetadata,
    ) -> Result<ChunkStream, LlmError> {
        let request = build_google_request(system, messages, metadata, self.temperature, self.max_tokens);
        let builder = self.with_auth(self.client.post(self.stream_url())).json(&request);

        let response = google_common::send(builder, self.name(), &metadata.cancel, &self.reporter).await?;

        Ok(google_common::normalize_stream(response, self.model.info.clone()))
    }

    async fn complete_prompt(&self, prompt: &str, options: &PromptOptions) -> Result<String, LlmError> {
        let messages = [Message::text(Role::User, prompt)];
        let request = build_google_request(
            options.system.as_deref().unwrap_or(""),
            &messages,
            &CallMetadata::default(),
            self.temperature,
            self.max_tokens,
        );
        let builder = self.with_auth(self.client.post(self.generate_url())).json(&request);

        let response = google_common::send(builder, self.name(), &options.cancel, &self.reporter).await?;

        google_common::complete(response, self.name(), &options.cancel, &self.reporter).await
    }
}

#[cfg(test)]
mod tests {
    use prism_telemetry::NoopReporter;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn default_model_when_unconfigured() {
        let provider = GeminiProvider::new(&ProviderConfig::default(), Arc::new(NoopReporter));
        assert_eq!(provider.model().id, DEFAULT_MODEL);
        assert!(provider.model().info.supports_images);
    }

    #[test]
    fn stream_url_targets_the_model() {
        let provider = GeminiProvider::new(&ProviderConfig::default(), Arc::new(NoopReporter));
        assert_eq!(
            provider.stream_url(),
            format!("{DEFAULT_BASE_URL}/models/{DEFAULT_MODEL}:streamGenerateContent?alt=sse")
        );
    }
}
