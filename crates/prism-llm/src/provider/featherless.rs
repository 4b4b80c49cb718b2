//! Featherless AI provider implementation
//!
//! Like Chutes, Featherless serves DeepSeek-R1 models whose reasoning
//! arrives inline as `<think>…</think>` tags in plain text deltas.

use async_trait::async_trait;
use prism_config::ProviderConfig;
use prism_telemetry::Reporter;

use super::engine::{ChatEngine, EngineQuirks};
use super::{ChunkStream, Provider};
use crate::error::LlmError;
use crate::types::{CallMetadata, Message, ModelInfo, PromptOptions, ResolvedModel};

const DEFAULT_BASE_URL: &str = "https://api.featherless.ai/v1";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-R1-0528";

fn models() -> Vec<(&'static str, ModelInfo)> {
    vec![
        (
            "deepseek-ai/DeepSeek-R1-0528",
            ModelInfo {
                max_tokens: Some(32_768),
                context_window: 32_768,
                input_price: Some(0.0),
                output_price: Some(0.0),
                ..ModelInfo::default()
            },
        ),
        (
            "deepseek-ai/DeepSeek-V3-0324",
            ModelInfo {
                max_tokens: Some(32_768),
                context_window: 32_768,
                input_price: Some(0.0),
                output_price: Some(0.0),
                ..ModelInfo::default()
            },
        ),
        (
            "meta-llama/Meta-Llama-3.1-8B-Instruct",
            ModelInfo {
                max_tokens: Some(16_384),
                context_window: 16_384,
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

/// Featherless chat completions handler
pub struct FeatherlessProvider {
    engine: ChatEngine,
    model: ResolvedModel,
}

impl FeatherlessProvider {
    /// Create from provider configuration
    pub fn new(config: &ProviderConfig, reporter: Reporter) -> Self {
        let model = ResolvedModel::resolve(config.model.as_deref(), DEFAULT_MODEL, &models());
        let engine = ChatEngine::from_config(
            config,
            DEFAULT_BASE_URL,
            &model,
            EngineQuirks {
                provider: "Featherless",
                reasoning_field: false,
                think_tags: Some(emits_think_tags),
            },
            reporter,
        );
        Self { engine, model }
    }
}

#[async_trait]
impl Provider for FeatherlessProvider {
    fn name(&self) -> &'static str {
        "Featherless"
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
