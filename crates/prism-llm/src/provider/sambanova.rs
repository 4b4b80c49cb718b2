//! SambaNova provider implementation

use async_trait::async_trait;
use prism_config::ProviderConfig;
use prism_telemetry::Reporter;

use super::engine::{ChatEngine, EngineQuirks};
use super::{ChunkStream, Provider};
use crate::error::LlmError;
use crate::types::{CallMetadata, Message, ModelInfo, PromptOptions, ResolvedModel};

const DEFAULT_BASE_URL: &str = "https://api.sambanova.ai/v1";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "Meta-Llama-3.3-70B-Instruct";

fn models() -> Vec<(&'static str, ModelInfo)> {
    vec![
        (
            "Meta-Llama-3.3-70B-Instruct",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 131_072,
                input_price: Some(0.6),
                output_price: Some(1.2),
                ..ModelInfo::default()
            },
        ),
        (
            "DeepSeek-R1",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 32_768,
                input_price: Some(5.0),
                output_price: Some(7.0),
                ..ModelInfo::default()
            },
        ),
        (
            "DeepSeek-V3-0324",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 32_768,
                input_price: Some(3.0),
                output_price: Some(4.5),
                ..ModelInfo::default()
            },
        ),
        (
            "Llama-4-Maverick-17B-128E-Instruct",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 131_072,
                supports_images: true,
                input_price: Some(0.63),
                output_price: Some(1.8),
                ..ModelInfo::default()
            },
        ),
    ]
}

/// SambaNova chat completions handler
///
/// SambaNova streams DeepSeek reasoning through the canonical
/// `reasoning_content` field.
pub struct SambanovaProvider {
    engine: ChatEngine,
    model: ResolvedModel,
}

impl SambanovaProvider {
    /// Create from provider configuration
    pub fn new(config: &ProviderConfig, reporter: Reporter) -> Self {
        let model = ResolvedModel::resolve(config.model.as_deref(), DEFAULT_MODEL, &models());
        let engine = ChatEngine::from_config(
            config,
            DEFAULT_BASE_URL,
            &model,
            EngineQuirks {
                provider: "SambaNova",
                reasoning_field: true,
                think_tags: None,
            },
            reporter,
        );
        Self { engine, model }
    }
}

#[async_trait]
impl Provider for SambanovaProvider {
    fn name(&self) -> &'static str {
        "SambaNova"
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
        let provider = SambanovaProvider::new(&ProviderConfig::default(), Arc::new(NoopReporter));
        assert_eq!(provider.model().id, DEFAULT_MODEL);
    }
}
