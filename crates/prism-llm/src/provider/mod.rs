//! Provider trait and per-vendor handler implementations

pub mod bedrock;
pub mod cerebras;
pub mod chutes;
pub mod deepseek;
pub(crate) mod engine;
pub mod featherless;
pub mod fireworks;
pub mod gemini;
pub(crate) mod google_common;
pub mod groq;
pub mod huggingface;
pub mod sambanova;
pub mod vertex;
pub mod xai;
pub mod zai;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::Stream;
use prism_config::{ProviderConfig, ProviderKind};
use prism_telemetry::Reporter;

use crate::error::LlmError;
use crate::types::{CallMetadata, Message, PromptOptions, ResolvedModel, StreamChunk};

/// A pull-based stream of normalized output chunks
///
/// Nothing is produced unless polled; consumers cancel by dropping the
/// stream. The usage chunk appears exactly once, after all other chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, LlmError>> + Send>>;

/// Capability interface implemented by each vendor handler
///
/// Handlers hold configuration only — no per-call mutable state — so one
/// instance may serve concurrent calls.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Vendor display name, used in wrapped error messages
    fn name(&self) -> &'static str;

    /// The model this handler is configured for
    fn model(&self) -> ResolvedModel;

    /// Begin a streaming generation
    ///
    /// The cancellation token in `metadata` is honored before the request
    /// is issued; afterwards, dropping the stream abandons the call.
    async fn create_message(
        &self,
        system: &str,
        messages: &[Message],
        metadata: &CallMetadata,
    ) -> Result<ChunkStream, LlmError>;

    /// One-shot prompt completion with no streaming
    async fn complete_prompt(&self, prompt: &str, options: &PromptOptions) -> Result<String, LlmError>;
}

/// Build a handler for one configured provider entry
///
/// # Errors
///
/// Returns `LlmError::Config` when the entry is missing vendor-specific
/// settings the handler needs.
pub async fn from_config(config: &ProviderConfig, reporter: Reporter) -> Result<Arc<dyn Provider>, LlmError> {
    let provider: Arc<dyn Provider> = match config.kind {
        ProviderKind::Bedrock => Arc::new(bedrock::BedrockProvider::new(config, reporter).await?),
        ProviderKind::Gemini => Arc::new(gemini::GeminiProvider::new(config, reporter)),
        ProviderKind::Vertex => Arc::new(vertex::VertexProvider::new(config, reporter)?),
        ProviderKind::Groq => Arc::new(groq::GroqProvider::new(config, reporter)),
        ProviderKind::Xai => Arc::new(xai::XaiProvider::new(config, reporter)),
        ProviderKind::Fireworks => Arc::new(fireworks::FireworksProvider::new(config, reporter)),
        ProviderKind::Deepseek => Arc::new(deepseek::DeepseekProvider::new(config, reporter)),
        ProviderKind::Cerebras => Arc::new(cerebras::CerebrasProvider::new(config, reporter)),
        ProviderKind::Chutes => Arc::new(chutes::ChutesProvider::new(config, reporter)),
        ProviderKind::Featherless => Arc::new(featherless::FeatherlessProvider::new(config, reporter)),
        ProviderKind::Huggingface => Arc::new(huggingface::HuggingfaceProvider::new(config, reporter)),
        ProviderKind::Sambanova => Arc::new(sambanova::SambanovaProvider::new(config, reporter)),
        ProviderKind::Zai => Arc::new(zai::ZaiProvider::new(config, reporter)),
    };

    Ok(provider)
}
