//! DeepSeek provider implementation
//!
//! DeepSeek reports prompt-cache accounting as
//! `prompt_cache_hit_tokens`/`prompt_cache_miss_tokens` and streams
//! reasoning through the canonical `reasoning_content` field.

use async_trait::async_trait;
use prism_config::ProviderConfig;
use prism_telemetry::Reporter;

use super::engine::{ChatEngine, EngineQuirks};
use super::{ChunkStream, Provider};
use crate::error::LlmError;
use crate::types::{CallMetadata, Message, ModelInfo, PromptOptions, ResolvedModel};

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "deepseek-chat";

fn models() -> Vec<(&'static str, ModelInfo)> {
    vec![
        (
            "deepseek-chat",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 128_000,
                supports_prompt_cache: true,
                input_price: Some(0.27),
                output_price: Some(1.1),
                cache_reads_price: Some(0.07),
                default_temperature: Some(0.6),
                ..ModelInfo::default()
            },
        ),
        (
            "deepseek-reasoner",
            ModelInfo {
                max_tokens: Some(65_536),
                context_window: 128_000,
                supports_prompt_cache: true,
                input_price: Some(0.55),
                output_price: Some(2.19),
                cache_reads_price: Some(0.14),
                default_temperature: Some(0.6),
                ..ModelInfo::default()
            },
        ),
    ]
}

/// DeepSeek chat completions handler
pub struct DeepseekProvider {
    engine: ChatEngine,
    model: ResolvedModel,
}

impl DeepseekProvider {
    /// Create from provider configuration
    pub fn new(config: &ProviderConfig, reporter: Reporter) -> Self {
        let model = ResolvedModel::resolve(config.model.as_deref(), DEFAULT_MODEL, &models());
        let engine = ChatEngine::from_config(
            config,
            DEFAULT_BASE_URL,
            &model,
            EngineQuirks {
                provider: "DeepSeek",
                reasoning_field: true,
                think_tags: None,
            },
            reporter,
        );
        Self { engine, model }
    }
}

#[async_trait]
impl Provider for DeepseekProvider {
    fn name(&self) -> &'static str {
        "DeepSeek"
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
        let provider = DeepseekProvider::new(&ProviderConfig::default(), Arc::new(NoopReporter));
        assert_eq!(provider.model().id, DEFAULT_MODEL);
        assert!(provider.model().info.supports_prompt_cache);
    }

    #[test]
    fn reasoner_model_resolves_from_table() {
        let config = ProviderConfig {
            model: Some("deepseek-reasoner".to_owned()),
            ..ProviderConfig::default()
        };
        let provider = DeepseekProvider::new(&config, Arc::new(NoopReporter));
        assert_eq!(provider.model().info.max_tokens, Some(65_536));
    }
}
