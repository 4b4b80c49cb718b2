//! Canonical internal types shared by all provider adapters

mod chunk;
mod message;
mod model;
mod request;
mod tool;

pub use chunk::{GroundingSource, StreamChunk, TokenUsage};
pub use message::{Content, ContentPart, Message, Role};
pub use model::{ModelInfo, PriceTier, ResolvedModel};
pub use request::{CallMetadata, PromptOptions};
pub use tool::{FunctionDefinition, ToolChoice, ToolChoiceMode, ToolDefinition};
