//! Chutes AI provider implementation
//!
//! Chutes serves DeepSeek-R1 models that emit reasoning inline as
//! `<think>…</think>` tags in the text stream rather than as a distinct
//! stream-part type; those model ids are routed through the streaming tag
//! matcher.

use async_trait::async_trait;
use prism_config::ProviderConfig;
use prism_telemetry::Reporter;

use super::engine::{ChatEngine, EngineQuirks};
use super::{ChunkStream, Provider};
use crate::error::LlmError;
use crate::types::{CallMetadata, Message, ModelInfo, PromptOptions, ResolvedModel};

const DEFAULT_BASE_URL: &str = "https://llm.chutes.ai/v1";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-R1";

fn models() -> Vec<(&'static str, ModelInfo)> {
    vec![
        (
            "deepseek-ai/DeepSeek-R1",
            ModelInfo {
                max_tokens: Some(32_768),
                context_window: 163_840,
                input_price: Some(0.0),
                output_price: Some(0.0),
                ..ModelInfo::default()
            },
        ),
        (
            "deepseek-ai/DeepSeek-R1-0528",
            ModelInfo {
                max_tokens: Some(32_768),
                context_window: 163_840,
                input_price: Some(0.0),
                output_price: Some(0.0),
                ..ModelInfo::default()
            },
        ),
        (
            "deepseek-ai/DeepSeek-V3",
            ModelInfo {
                max_tokens: Some(32_768),
                context_window: 163_840,
                input_price: Some(0.0),
                output_price: Some(0.0),
                ..ModelInfo::default()
            },
        ),
        (
            "Qwen/Qwen3-235B-A22B",
            ModelInfo {
                max_tokens: Some(32_768),
                context_window: 262_144,
                input_price: Some(0.0),
                output_price: Some(0.0),
                ..ModelInfo::default()
            },
        ),
    ]
}

fn emits_think_tags(model_id: &str) -> bool {
    model_id.to_lowercase().contains("deepseek-r1")
}

/// Chutes chat completions handler
pub struct ChutesProvider {
    engine: ChatEngine,
    model: ResolvedModel,
}

impl ChutesProvider {
    /// Create from provider configuration
    pub fn new(config: &ProviderConfig, reporter: Reporter) -> Self {
        let model = ResolvedModel::resolve(config.model.as_deref(), DEFAULT_MODEL, &models());
        let engine = ChatEngine::from_config(
            config,
            DEFAULT_BASE_URL,
            &model,
            EngineQuirks {
                provider: "Chutes",
                reasoning_field: false,
                think_tags: Some(emits_think_tags),
            },
            reporter,
        );
        Self { engine, model }
    }
}

#[async_trait]
impl Provider for ChutesProvider {
    fn name(&self) -> &'static str {
        "Chutes"
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
        let provider = ChutesProvider::new(&ProviderConfig::default(), Arc::new(NoopReporter));
        assert_eq!(provider.model().id, DEFAULT_MODEL);
    }

    #[test]
    fn r1_ids_use_the_think_tag_path() {
        assert!(emits_think_tags("deepseek-ai/DeepSeek-R1"));
        assert!(emits_think_tags("deepseek-ai/DeepSeek-R1-0528"));
        assert!(!emits_think_tags("deepseek-ai/DeepSeek-V3"));
    }
}
