//! Groq provider implementation

use async_trait::async_trait;
use prism_config::ProviderConfig;
use prism_telemetry::Reporter;

use super::engine::{ChatEngine, EngineQuirks};
use super::{ChunkStream, Provider};
use crate::error::LlmError;
use crate::types::{CallMetadata, Message, ModelInfo, PromptOptions, ResolvedModel};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

fn models() -> Vec<(&'static str, ModelInfo)> {
    vec![
        (
            "llama-3.3-70b-versatile",
            ModelInfo {
                max_tokens: Some(32_768),
                context_window: 131_072,
                input_price: Some(0.59),
                output_price: Some(0.79),
                default_temperature: Some(0.5),
                ..ModelInfo::default()
            },
        ),
        (
            "llama-3.1-8b-instant",
            ModelInfo {
                max_tokens: Some(131_072),
                context_window: 131_072,
                input_price: Some(0.05),
                output_price: Some(0.08),
                default_temperature: Some(0.5),
                ..ModelInfo::default()
            },
        ),
        (
            "deepseek-r1-distill-llama-70b",
            ModelInfo {
                max_tokens: Some(131_072),
                context_window: 131_072,
                input_price: Some(0.75),
                output_price: Some(0.99),
                default_temperature: Some(0.5),
                ..ModelInfo::default()
            },
        ),
        (
            "moonshotai/kimi-k2-instruct",
            ModelInfo {
                max_tokens: Some(16_384),
                context_window: 131_072,
                input_price: Some(1.0),
                output_price: Some(3.0),
                default_temperature: Some(0.5),
                ..ModelInfo::default()
            },
        ),
    ]
}

/// Groq chat completions handler
pub struct GroqProvider {
    engine: ChatEngine,
    model: ResolvedModel,
}

impl GroqProvider {
    /// Create from provider configuration
    pub fn new(config: &ProviderConfig, reporter: Reporter) -> Self {
        let model = ResolvedModel::resolve(config.model.as_deref(), DEFAULT_MODEL, &models());
        let engine = ChatEngine::from_config(
            config,
            DEFAULT_BASE_URL,
            &model,
            EngineQuirks {
                provider: "Groq",
                reasoning_field: false,
                think_tags: None,
            },
            reporter,
        );
        Self { engine, model }
    }
}

#[async_trait]
impl Provider for GroqProvider {
    fn name(&self) -> &'static str {
        "Groq"
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
        self.engine.stream_chat(&self.model, system, messages, metadata).await
    }

    async fn complete_prompt(&self, prompt: &str, options: &PromptOptions) -> Result<String, LlmError> {
        self.engine.chat(&self.model, prompt, options).await
    }
}

#[cfg(test)]
mod tests {
    use prism_telemetry::NoopReporter;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn default_model_when_unconfigured() {
        let provider = GroqProvider::new(&ProviderConfig::default(), Arc::new(NoopReporter));
        assert_eq!(provider.model().id, DEFAULT_MODEL);
        assert_eq!(provider.model().info.context_window, 131_072);
    }

    #[test]
    fn unknown_model_id_preserved_with_default_info() {
        let config = ProviderConfig {
            model: Some("brand-new-llama".to_owned()),
            ..ProviderConfig::default()
        };
        let provider = GroqProvider::new(&config, Arc::new(NoopReporter));
        assert_eq!(provider.model().id, "brand-new-llama");
        assert_eq!(provider.model().info.context_window, 131_072);
    }
}
