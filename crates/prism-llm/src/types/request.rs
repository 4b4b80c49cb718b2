use tokio_util::sync::CancellationToken;

use super::tool::{ToolChoice, ToolDefinition};

/// Per-call metadata for a streaming generation
#[derive(Debug, Clone, Default)]
pub struct CallMetadata {
    /// Caller task identifier, attached to logs
    pub task_id: Option<String>,
    /// Tool definitions available to the model
    pub tools: Vec<ToolDefinition>,
    /// How the model should select tools
    pub tool_choice: Option<ToolChoice>,
    /// Cancels the call; checked before the request is issued
    pub cancel: CancellationToken,
}

/// Options for a one-shot prompt completion
#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    /// Optional system prompt
    pub system: Option<String>,
    /// Cancels the call before or while awaiting the response
    pub cancel: CancellationToken,
}
