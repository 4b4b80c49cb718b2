//! Metric name constants

// LLM metric names
pub const LLM_REQUEST_DURATION: &str = "llm.request.duration";
pub const LLM_REQUEST_COUNT: &str = "llm.request.count";
pub const LLM_REQUEST_ERRORS: &str = "llm.request.errors";
pub const LLM_TOKEN_USAGE: &str = "llm.token.usage";
pub const LLM_STREAMING_DURATION: &str = "llm.streaming.duration";
pub const LLM_TIME_TO_FIRST_TOKEN: &str = "llm.time_to_first_token";
