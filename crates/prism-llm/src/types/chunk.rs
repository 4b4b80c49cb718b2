use serde::{Deserialize, Serialize};

/// One normalized unit of incremental model output
///
/// Produced one at a time from the vendor stream and consumed immediately;
/// never persisted. The usage chunk appears exactly once, after all other
/// chunks of a completed stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamChunk {
    /// Incremental answer text
    Text {
        /// The text fragment
        text: String,
    },
    /// Incremental reasoning/thinking text
    Reasoning {
        /// The reasoning fragment
        text: String,
        /// Vendor signature over the finished reasoning block, when surfaced
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    /// A tool invocation has started
    ToolCallStart {
        /// Unique identifier for this call
        id: String,
        /// Function name
        name: String,
    },
    /// Incremental tool-call argument JSON
    ToolCallDelta {
        /// Identifier of the open call
        id: String,
        /// Arguments fragment
        arguments: String,
    },
    /// A tool invocation has finished streaming
    ToolCallEnd {
        /// Identifier of the closed call
        id: String,
    },
    /// Web sources the response was grounded on
    Grounding {
        /// The grounding sources
        sources: Vec<GroundingSource>,
    },
    /// Final token usage and cost (sent once, at stream end)
    Usage(TokenUsage),
    /// A vendor-reported error event, passed through with its raw message
    Error {
        /// Raw error message
        message: String,
    },
}

/// A web source a grounded response cites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    /// Source URL
    pub url: String,
    /// Page title, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Token usage for one completed request
///
/// Created once per request from vendor-reported counters; never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt, including any cached portion
    pub input_tokens: u64,
    /// Tokens generated in the completion
    pub output_tokens: u64,
    /// Prompt tokens served from the vendor cache
    #[serde(default)]
    pub cache_read_tokens: u64,
    /// Prompt tokens written to the vendor cache
    #[serde(default)]
    pub cache_write_tokens: u64,
    /// Reasoning tokens, billed with output
    #[serde(default)]
    pub reasoning_tokens: u64,
    /// Derived monetary cost in USD, when prices are known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
}
