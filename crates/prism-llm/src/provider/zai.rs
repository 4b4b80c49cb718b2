//! Z.ai provider implementation
//!
//! Z.ai serves two API lines with separate hosts: the international line
//! at api.z.ai and the mainland line at open.bigmodel.cn. The entrypoint
//! flag in configuration selects between them; an explicit base URL
//! overrides both.

use async_trait::async_trait;
use prism_config::{ProviderConfig, ZaiEntrypoint};
use prism_telemetry::Reporter;

use super::engine::{ChatEngine, EngineQuirks};
use super::{ChunkStream, Provider};
use crate::error::LlmError;
use crate::types::{CallMetadata, Message, ModelInfo, PromptOptions, ResolvedModel};

const INTERNATIONAL_BASE_URL: &str = "https://api.z.ai/api/paas/v4";
const MAINLAND_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "glm-4.5";

fn models() -> Vec<(&'static str, ModelInfo)> {
    vec![
        (
            "glm-4.5",
            ModelInfo {
                max_tokens: Some(98_304),
                context_window: 131_072,
                supports_prompt_cache: true,
                input_price: Some(0.6),
                output_price: Some(2.2),
                cache_reads_price: Some(0.11),
                ..ModelInfo::default()
            },
        ),
        (
            "glm-4.6",
            ModelInfo {
                max_tokens: Some(98_304),
                context_window: 204_800,
                supports_prompt_cache: true,
                input_price: Some(0.6),
                output_price: Some(2.2),
                cache_reads_price: Some(0.11),
                ..ModelInfo::default()
            },
        ),
        (
            "glm-4.5-air",
            ModelInfo {
                max_tokens: Some(98_304),
                context_window: 131_072,
                supports_prompt_cache: true,
                input_price: Some(0.2),
                output_price: Some(1.1),
                cache_reads_price: Some(0.03),
                ..ModelInfo::default()
            },
        ),
        (
            "glm-4.5-flash",
            ModelInfo {
                max_tokens: Some(98_304),
                context_window: 131_072,
                input_price: Some(0.0),
                output_price: Some(0.0),
                ..ModelInfo::default()
            },
        ),
    ]
}

/// Z.ai chat completions handler
pub struct ZaiProvider {
    engine: ChatEngine,
    model: ResolvedModel,
}

impl ZaiProvider {
    /// Create from provider configuration
    pub fn new(config: &ProviderConfig, reporter: Reporter) -> Self {
        let model = ResolvedModel::resolve(config.model.as_deref(), DEFAULT_MODEL, &models());
        let default_base_url = match config.entrypoint {
            Some(ZaiEntrypoint::Mainland) => MAINLAND_BASE_URL,
            _ => INTERNATIONAL_BASE_URL,
        };
        let engine = ChatEngine::from_config(
            config,
            default_base_url,
            &model,
            EngineQuirks {
                provider: "Z.ai",
                reasoning_field: true,
                think_tags: None,
            },
            reporter,
        );
        Self { engine, model }
    }
}

#[async_trait]
impl Provider for ZaiProvider {
    fn name(&self) -> &'static str {
        "Z.ai"
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
        let provider = ZaiProvider::new(&ProviderConfig::default(), Arc::new(NoopReporter));
        assert_eq!(provider.model().id, DEFAULT_MODEL);
        assert!(provider.model().info.supports_prompt_cache);
    }
}
