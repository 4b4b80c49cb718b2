//! Cerebras provider implementation

use async_trait::async_trait;
use prism_config::ProviderConfig;
use prism_telemetry::Reporter;

use super::engine::{ChatEngine, EngineQuirks};
use super::{ChunkStream, Provider};
use crate::error::LlmError;
use crate::types::{CallMetadata, Message, ModelInfo, PromptOptions, ResolvedModel};

const DEFAULT_BASE_URL: &str = "https://api.cerebras.ai/v1";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "llama-3.3-70b";

fn models() -> Vec<(&'static str, ModelInfo)> {
    vec![
        (
            "llama-3.3-70b",
            ModelInfo {
                max_tokens: Some(16_384),
                context_window: 65_536,
                input_price: Some(0.85),
                output_price: Some(1.2),
                ..ModelInfo::default()
            },
        ),
        (
            "llama3.1-8b",
            ModelInfo {
                max_tokens: Some(16_384),
                context_window: 32_768,
                input_price: Some(0.1),
                output_price: Some(0.1),
                ..ModelInfo::default()
            },
        ),
        (
            "qwen-3-32b",
            ModelInfo {
                max_tokens: Some(16_384),
                context_window: 65_536,
                input_price: Some(0.4),
                output_price: Some(0.8),
                ..ModelInfo::default()
            },
        ),
        (
            "gpt-oss-120b",
            ModelInfo {
                max_tokens: Some(32_768),
                context_window: 131_072,
                input_price: Some(0.35),
                output_price: Some(0.75),
                ..ModelInfo::default()
            },
        ),
    ]
}

/// Cerebras chat completions handler
///
/// Qwen models on Cerebras emit inline `<think>` reasoning.
pub struct CerebrasProvider {
    engine: ChatEngine,
    model: ResolvedModel,
}

fn emits_think_tags(model_id: &str) -> bool {
    model_id.to_lowercase().starts_with("qwen")
}

impl CerebrasProvider {
    /// Create from provider configuration
    pub fn new(config: &ProviderConfig, reporter: Reporter) -> Self {
        let model = ResolvedModel::resolve(config.model.as_deref(), DEFAULT_MODEL, &models());
        let engine = ChatEngine::from_config(
            config,
            DEFAULT_BASE_URL,
            &model,
            EngineQuirks {
                provider: "Cerebras",
                reasoning_field: false,
                think_tags: Some(emits_think_tags),
            },
            reporter,
        );
        Self { engine, model }
    }
}

#[async_trait]
impl Provider for CerebrasProvider {
    fn name(&self) -> &'static str {
        "Cerebras"
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
        let provider = CerebrasProvider::new(&ProviderConfig::default(), Arc::new(NoopReporter));
        assert_eq!(provider.model().id, DEFAULT_MODEL);
    }

    #[test]
    fn qwen_models_use_the_think_tag_path() {
        assert!(emits_think_tags("qwen-3-32b"));
        assert!(!emits_think_tags("llama-3.3-70b"));
    }
}
