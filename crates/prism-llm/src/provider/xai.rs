//! xAI provider implementation

use async_trait::async_trait;
use prism_config::ProviderConfig;
use prism_telemetry::Reporter;

use super::engine::{ChatEngine, EngineQuirks};
use super::{ChunkStream, Provider};
use crate::error::LlmError;
use crate::types::{CallMetadata, Message, ModelInfo, PromptOptions, ResolvedModel};

const DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "grok-code-fast-1";

fn models() -> Vec<(&'static str, ModelInfo)> {
    vec![
        (
            "grok-code-fast-1",
            ModelInfo {
                max_tokens: Some(16_384),
                context_window: 262_144,
                supports_prompt_cache: true,
                input_price: Some(0.2),
                output_price: Some(1.5),
                cache_reads_price: Some(0.02),
                ..ModelInfo::default()
            },
        ),
        (
            "grok-4",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 262_144,
                supports_images: true,
                supports_prompt_cache: true,
                input_price: Some(3.0),
                output_price: Some(15.0),
                cache_reads_price: Some(0.75),
                ..ModelInfo::default()
            },
        ),
        (
            "grok-3",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 131_072,
                input_price: Some(3.0),
                output_price: Some(15.0),
                cache_reads_price: Some(0.75),
                supports_prompt_cache: true,
                ..ModelInfo::default()
            },
        ),
        (
            "grok-3-mini",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 131_072,
                input_price: Some(0.3),
                output_price: Some(0.5),
                supports_prompt_cache: true,
                cache_reads_price: Some(0.07),
                ..ModelInfo::default()
            },
        ),
    ]
}

/// xAI chat completions handler
///
/// Grok reasoning models surface thinking via the `reasoning_content`
/// stream field.
pub struct XaiProvider {
    engine: ChatEngine,
    model: ResolvedModel,
}

impl XaiProvider {
    /// Create from provider configuration
    pub fn new(config: &ProviderConfig, reporter: Reporter) -> Self {
        let model = ResolvedModel::resolve(config.model.as_deref(), DEFAULT_MODEL, &models());
        let engine = ChatEngine::from_config(
            config,
            DEFAULT_BASE_URL,
            &model,
            EngineQuirks {
                provider: "xAI",
                reasoning_field: true,
                think_tags: None,
            },
            reporter,
        );
        Self { engine, model }
    }
}

#[async_trait]
impl Provider for XaiProvider {
    fn name(&self) -> &'static str {
        "xAI"
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
        let provider = XaiProvider::new(&ProviderConfig::default(), Arc::new(NoopReporter));
        assert_eq!(provider.model().id, DEFAULT_MODEL);
        assert!(provider.model().info.supports_prompt_cache);
    }
}
