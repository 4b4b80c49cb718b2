//! Fireworks AI provider implementation

use async_trait::async_trait;
use prism_config::ProviderConfig;
use prism_telemetry::Reporter;

use super::engine::{ChatEngine, EngineQuirks};
use super::{ChunkStream, Provider};
use crate::error::LlmError;
use crate::types::{CallMetadata, Message, ModelInfo, PromptOptions, ResolvedModel};

const DEFAULT_BASE_URL: &str = "https://api.fireworks.ai/inference/v1";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "accounts/fireworks/models/kimi-k2-instruct";

fn models() -> Vec<(&'static str, ModelInfo)> {
    vec![
        (
            "accounts/fireworks/models/kimi-k2-instruct",
            ModelInfo {
                max_tokens: Some(16_384),
                context_window: 131_072,
                input_price: Some(0.6),
                output_price: Some(2.5),
                ..ModelInfo::default()
            },
        ),
        (
            "accounts/fireworks/models/deepseek-r1-0528",
            ModelInfo {
                max_tokens: Some(20_480),
                context_window: 163_840,
                input_price: Some(3.0),
                output_price: Some(8.0),
                ..ModelInfo::default()
            },
        ),
        (
            "accounts/fireworks/models/deepseek-v3",
            ModelInfo {
                max_tokens: Some(16_384),
                context_window: 131_072,
                input_price: Some(0.9),
                output_price: Some(0.9),
                ..ModelInfo::default()
            },
        ),
        (
            "accounts/fireworks/models/qwen3-coder-480b-a35b-instruct",
            ModelInfo {
                max_tokens: Some(32_768),
                context_window: 262_144,
                input_price: Some(0.45),
                output_price: Some(1.8),
                ..ModelInfo::default()
            },
        ),
    ]
}

/// Fireworks chat completions handler
///
/// Fireworks serves DeepSeek reasoning models with the canonical
/// `reasoning_content` stream field.
pub struct FireworksProvider {
    engine: ChatEngine,
    model: ResolvedModel,
}

impl FireworksProvider {
    /// Create from provider configuration
    pub fn new(config: &ProviderConfig, reporter: Reporter) -> Self {
        let model = ResolvedModel::resolve(config.model.as_deref(), DEFAULT_MODEL, &models());
        let engine = ChatEngine::from_config(
            config,
            DEFAULT_BASE_URL,
            &model,
            EngineQuirks {
                provider: "Fireworks",
                reasoning_field: true,
                think_tags: None,
            },
            reporter,
        );
        Self { engine, model }
    }
}

#[async_trait]
impl Provider for FireworksProvider {
    fn name(&self) -> &'static str {
        "Fireworks"
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
        let provider = FireworksProvider::new(&ProviderConfig::default(), Arc::new(NoopReporter));
        assert_eq!(provider.model().id, DEFAULT_MODEL);
    }
}
