//! Hugging Face inference router provider implementation

use async_trait::async_trait;
use prism_config::ProviderConfig;
use prism_telemetry::Reporter;

use super::engine::{ChatEngine, EngineQuirks};
use super::{ChunkStream, Provider};
use crate::error::LlmError;
use crate::types::{CallMetadata, Message, ModelInfo, PromptOptions, ResolvedModel};

const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/v1";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "meta-llama/Llama-3.3-70B-Instruct";

fn models() -> Vec<(&'static str, ModelInfo)> {
    vec![
        (
            "meta-llama/Llama-3.3-70B-Instruct",
            ModelInfo {
                max_tokens: Some(8_192),
                context_window: 131_072,
                ..ModelInfo::default()
            },
        ),
        (
            "Qwen/Qwen3-Coder-480B-A35B-Instruct",
            ModelInfo {
                max_tokens: Some(32_768),
                context_window: 262_144,
                ..ModelInfo::default()
            },
        ),
        (
            "deepseek-ai/DeepSeek-V3-0324",
            ModelInfo {
                max_tokens: Some(16_384),
                context_window: 131_072,
                ..ModelInfo::default()
            },
        ),
    ]
}

/// Hugging Face router handler
///
/// The router fronts many inference partners behind one OpenAI-compatible
/// surface; pricing varies by partner, so the table carries no prices and
/// cost comes back `None`.
pub struct HuggingfaceProvider {
    engine: ChatEngine,
    model: ResolvedModel,
}

impl HuggingfaceProvider {
    /// Create from provider configuration
    pub fn new(config: &ProviderConfig, reporter: Reporter) -> Self {
        let model = ResolvedModel::resolve(config.model.as_deref(), DEFAULT_MODEL, &models());
        let engine = ChatEngine::from_config(
            config,
            DEFAULT_BASE_URL,
            &model,
            EngineQuirks {
                provider: "HuggingFace",
                reasoning_field: false,
                think_tags: None,
            },
            reporter,
        );
        Self { engine, model }
    }
}

#[async_trait]
impl Provider for HuggingfaceProvider {
    fn name(&self) -> &'static str {
        "HuggingFace"
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
