//! Unified provider adapter layer for Prism
//!
//! Translates one internal message format into the request/response shapes
//! of the supported LLM vendors (Bedrock, Gemini, Vertex, Groq, xAI,
//! Fireworks, DeepSeek, Cerebras, Chutes, Featherless, `HuggingFace`,
//! SambaNova, Z.ai), normalizes their streams into a single chunk union,
//! and derives per-request cost from static price tables.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod convert;
pub mod error;
pub mod pricing;
pub mod protocol;
pub mod provider;
pub mod types;

pub use error::{LlmError, is_throttling_error};
pub use pricing::calculate_cost;
pub use provider::{ChunkStream, Provider, from_config};
pub use types::{
    CallMetadata, Content, ContentPart, GroundingSource, Message, ModelInfo, PromptOptions, ResolvedModel, Role,
    StreamChunk, TokenUsage, ToolChoice, ToolChoiceMode, ToolDefinition,
};
