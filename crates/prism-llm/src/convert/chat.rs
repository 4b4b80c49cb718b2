//! Conversion between internal types and the chat-completions wire format

use crate::pricing;
use crate::protocol::chat::{
    ChatChoiceMessage, ChatContent, ChatContentPart, ChatFunction, ChatFunctionCall, ChatImageUrl, ChatMessage,
    ChatRequest, ChatStreamChunk, ChatStreamOptions, ChatTool, ChatToolCall, ChatUsage,
};
use crate::types::{
    CallMetadata, Content, ContentPart, Message, ModelInfo, ResolvedModel, Role, StreamChunk, TokenUsage, ToolChoice,
    ToolChoiceMode, ToolDefinition,
};

/// Parameters for building one wire request
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatRequestParams {
    /// Sampling temperature (vendor default applied upstream)
    pub temperature: Option<f64>,
    /// Maximum output tokens
    pub max_tokens: Option<u32>,
    /// Whether the response will be streamed
    pub stream: bool,
    /// Whether the vendor has a canonical `reasoning_content` message field
    pub reasoning_field: bool,
}

/// Build a chat-completions request from internal messages
pub fn build_chat_request(
    model: &ResolvedModel,
    system: &str,
    messages: &[Message],
    metadata: &CallMetadata,
    params: ChatRequestParams,
) -> ChatRequest {
    let tools = build_tool_set(&metadata.tools);

    ChatRequest {
        model: model.id.clone(),
        messages: messages_to_wire(system, messages, params.reasoning_field),
        temperature: params.temperature,
        max_tokens: params.max_tokens,
        stream: params.stream.then_some(true),
        tools,
        tool_choice: metadata.tool_choice.as_ref().map(tool_choice_to_wire),
        stream_options: params.stream.then_some(ChatStreamOptions { include_usage: true }),
    }
}

/// Convert internal messages to wire messages
///
/// Tool-result parts are hoisted into tool-role messages first; malformed
/// or out-of-place parts are silently dropped. Assistant reasoning parts
/// are carried in the canonical `reasoning_content` field when the vendor
/// has one and dropped otherwise.
pub fn messages_to_wire(system: &str, messages: &[Message], reasoning_field: bool) -> Vec<ChatMessage> {
    let mut wire = Vec::with_capacity(messages.len() + 1);

    if !system.is_empty() {
        wire.push(ChatMessage {
            role: "system".to_owned(),
            content: Some(ChatContent::Text(system.to_owned())),
            tool_calls: None,
            tool_call_id: None,
            reasoning_content: None,
        });
    }

    for msg in super::split_tool_results(messages) {
        match msg.role {
            Role::System => wire.push(ChatMessage {
                role: "system".to_owned(),
                content: Some(ChatContent::Text(msg.content.as_text())),
                tool_calls: None,
                tool_call_id: None,
                reasoning_content: None,
            }),
            Role::Tool => {
                // split_tool_results leaves exactly one result part here
                if let Some(ContentPart::ToolResult { tool_call_id, content }) = msg.content.parts().into_iter().next()
                {
                    wire.push(ChatMessage {
                        role: "tool".to_owned(),
                        content: Some(ChatContent::Text(content)),
                        tool_calls: None,
                        tool_call_id: Some(tool_call_id),
                        reasoning_content: None,
                    });
                }
            }
            Role::User => wire.push(user_message_to_wire(&msg)),
            Role::Assistant => wire.push(assistant_message_to_wire(&msg, reasoning_field)),
        }
    }

    wire
}

/// Convert a user message, keeping text and image parts
fn user_message_to_wire(msg: &Message) -> ChatMessage {
    let content = match &msg.content {
        Content::Text(text) => ChatContent::Text(text.clone()),
        Content::Parts(parts) => {
            let wire_parts: Vec<ChatContentPart> = parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(ChatContentPart::Text { text: text.clone() }),
                    ContentPart::Image { url, detail } => Some(ChatContentPart::ImageUrl {
                        image_url: ChatImageUrl {
                            url: url.clone(),
                            detail: detail.clone(),
                        },
                    }),
                    // Tool and reasoning parts do not belong on user turns
                    _ => None,
                })
                .collect();
            ChatContent::Parts(wire_parts)
        }
    };

    ChatMessage {
        role: "user".to_owned(),
        content: Some(content),
        tool_calls: None,
        tool_call_id: None,
        reasoning_content: None,
    }
}

/// Convert an assistant message, splitting out tool calls and reasoning
fn assistant_message_to_wire(msg: &Message, reasoning_field: bool) -> ChatMessage {
    let mut text = String::new();
    let mut reasoning = String::new();
    let mut tool_calls = Vec::new();

    for part in msg.content.parts() {
        match part {
            ContentPart::Text { text: t } => text.push_str(&t),
            ContentPart::Reasoning { text: t, .. } => reasoning.push_str(&t),
            ContentPart::ToolCall { id, name, arguments } => tool_calls.push(ChatToolCall {
                id,
                tool_type: "function".to_owned(),
                function: ChatFunctionCall { name, arguments },
            }),
            // Images and tool results do not belong on assistant turns
            _ => {}
        }
    }

    ChatMessage {
        role: "assistant".to_owned(),
        content: (!text.is_empty()).then_some(ChatContent::Text(text)),
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        tool_call_id: None,
        reasoning_content: (reasoning_field && !reasoning.is_empty()).then_some(reasoning),
    }
}

/// Convert a wire assistant message back into an internal message
///
/// A reasoning part is synthesized only when the canonical
/// `reasoning_content` field is present — embedded tag extraction happens
/// at the stream layer, so this avoids duplicating reasoning.
pub fn response_to_message(msg: &ChatChoiceMessage) -> Message {
    let mut parts = Vec::new();

    if let Some(reasoning) = &msg.reasoning_content
        && !reasoning.is_empty()
    {
        parts.push(ContentPart::Reasoning {
            text: reasoning.clone(),
            signature: None,
        });
    }

    if let Some(content) = &msg.content
        && !content.is_empty()
    {
        parts.push(ContentPart::Text { text: content.clone() });
    }

    if let Some(tool_calls) = &msg.tool_calls {
        for tc in tool_calls {
            parts.push(ContentPart::ToolCall {
                id: tc.id.clone(),
                name: tc.function.name.clone(),
                arguments: tc.function.arguments.clone(),
            });
        }
    }

    Message::parts(Role::Assistant, parts)
}

/// Build the vendor tool set, filtering out non-function entries
fn build_tool_set(tools: &[ToolDefinition]) -> Option<Vec<ChatTool>> {
    let wire_tools: Vec<ChatTool> = super::filter_function_tools(tools)
        .into_iter()
        .map(|t| ChatTool {
            tool_type: "function".to_owned(),
            function: ChatFunction {
                name: t.function.name.clone(),
                description: t.function.description.clone(),
                parameters: t.function.parameters.clone(),
            },
        })
        .collect();

    (!wire_tools.is_empty()).then_some(wire_tools)
}

/// Convert internal tool choice to the wire JSON value
fn tool_choice_to_wire(choice: &ToolChoice) -> serde_json::Value {
    match choice {
        ToolChoice::Mode(mode) => {
            let s = match mode {
                ToolChoiceMode::None => "none",
                ToolChoiceMode::Auto => "auto",
                ToolChoiceMode::Required => "required",
            };
            serde_json::Value::String(s.to_owned())
        }
        ToolChoice::Function { name } => serde_json::json!({
            "type": "function",
            "function": { "name": name }
        }),
    }
}

/// Map wire usage into normalized token usage with a derived cost
pub fn usage_from_wire(usage: &ChatUsage, info: &ModelInfo) -> TokenUsage {
    let cache_read_tokens = usage
        .prompt_cache_hit_tokens
        .or_else(|| usage.prompt_tokens_details.as_ref().map(|d| d.cached_tokens))
        .unwrap_or(0);

    let reasoning_tokens = usage
        .completion_tokens_details
        .as_ref()
        .map_or(0, |d| d.reasoning_tokens);

    let mut normalized = TokenUsage {
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
        cache_read_tokens,
        cache_write_tokens: 0,
        reasoning_tokens,
        total_cost: None,
    };
    normalized.total_cost = pricing::calculate_cost(info, &normalized);
    normalized
}

// -- Stream conversion --

/// Stateful converter from wire stream chunks to normalized chunks
///
/// Tracks open tool calls so streamed argument fragments resolve to stable
/// call ids, and suppresses the complete (non-streamed) tool-call form when
/// streamed input events for the same call are present — deliberate
/// de-duplication, matching every provider's normalization contract.
#[derive(Debug, Default)]
pub struct ChatStreamState {
    calls: Vec<TrackedCall>,
    usage: Option<ChatUsage>,
}

#[derive(Debug)]
struct TrackedCall {
    wire_index: u32,
    id: String,
    open: bool,
    streamed_input: bool,
}

impl ChatStreamState {
    /// Create a fresh per-call stream state
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert one wire chunk into zero or more normalized chunks
    ///
    /// Usage is held back; the handler emits it once after the stream ends.
    pub fn convert_chunk(&mut self, chunk: &ChatStreamChunk) -> Vec<StreamChunk> {
        let mut out = Vec::new();

        if let Some(error) = &chunk.error {
            out.push(StreamChunk::Error {
                message: error.message.clone(),
            });
        }

        for choice in &chunk.choices {
            if let Some(reasoning) = &choice.delta.reasoning_content
                && !reasoning.is_empty()
            {
                out.push(StreamChunk::Reasoning {
                    text: reasoning.clone(),
                    signature: None,
                });
            }
            if let Some(reasoning) = &choice.delta.reasoning
                && !reasoning.is_empty()
            {
                out.push(StreamChunk::Reasoning {
                    text: reasoning.clone(),
                    signature: None,
                });
            }
            if let Some(content) = &choice.delta.content
                && !content.is_empty()
            {
                out.push(StreamChunk::Text { text: content.clone() });
            }

            if let Some(tool_calls) = &choice.delta.tool_calls {
                for tc in tool_calls {
                    self.convert_tool_call(tc, &mut out);
                }
            }

            if choice.finish_reason.is_some() {
                self.close_open_calls(&mut out);
            }
        }

        if let Some(usage) = &chunk.usage {
            self.usage = Some(usage.clone());
        }

        out
    }

    /// Close any still-open tool calls once the stream is exhausted
    pub fn finish(&mut self) -> Vec<StreamChunk> {
        let mut out = Vec::new();
        self.close_open_calls(&mut out);
        out
    }

    /// Usage reported by the vendor, if any arrived
    pub fn take_usage(&mut self) -> Option<ChatUsage> {
        self.usage.take()
    }

    fn convert_tool_call(&mut self, tc: &crate::protocol::chat::ChatStreamToolCall, out: &mut Vec<StreamChunk>) {
        let name = tc.function.as_ref().and_then(|f| f.name.clone());
        let arguments = tc.function.as_ref().and_then(|f| f.arguments.clone());

        if let Some(tracked) = self.calls.iter_mut().find(|c| c.wire_index == tc.index) {
            // Complete (non-streamed) form repeated for a call whose input
            // already streamed: suppress to avoid duplicate invocations
            if tracked.streamed_input && tc.id.is_some() && name.is_some() && arguments.is_some() {
                return;
            }

            if let Some(arguments) = arguments {
                tracked.streamed_input = true;
                out.push(StreamChunk::ToolCallDelta {
                    id: tracked.id.clone(),
                    arguments,
                });
            }
            return;
        }

        // New call; vendors stream one call to completion before the next
        let Some(id) = tc.id.clone() else {
            // Argument fragment for a call that never started: drop it
            return;
        };

        self.close_open_calls(out);

        out.push(StreamChunk::ToolCallStart {
            id: id.clone(),
            name: name.unwrap_or_default(),
        });

        let mut tracked = TrackedCall {
            wire_index: tc.index,
            id,
            open: true,
            streamed_input: false,
        };

        if let Some(arguments) = arguments {
            tracked.streamed_input = true;
            out.push(StreamChunk::ToolCallDelta {
                id: tracked.id.clone(),
                arguments,
            });
        }

        self.calls.push(tracked);
    }

    fn close_open_calls(&mut self, out: &mut Vec<StreamChunk>) {
        for call in self.calls.iter_mut().filter(|c| c.open) {
            call.open = false;
            out.push(StreamChunk::ToolCallEnd { id: call.id.clone() });
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::chat::{ChatStreamChoice, ChatStreamDelta, ChatStreamFunctionCall, ChatStreamToolCall};

    use super::*;

    fn chunk_with_delta(delta: ChatStreamDelta, finish_reason: Option<&str>) -> ChatStreamChunk {
        ChatStreamChunk {
            id: "chunk".to_owned(),
            choices: vec![ChatStreamChoice {
                index: 0,
                delta,
                finish_reason: finish_reason.map(ToOwned::to_owned),
            }],
            usage: None,
            error: None,
        }
    }

    fn tool_delta(index: u32, id: Option<&str>, name: Option<&str>, arguments: Option<&str>) -> ChatStreamDelta {
        ChatStreamDelta {
            tool_calls: Some(vec![ChatStreamToolCall {
                index,
                id: id.map(ToOwned::to_owned),
                function: Some(ChatStreamFunctionCall {
                    name: name.map(ToOwned::to_owned),
                    arguments: arguments.map(ToOwned::to_owned),
                }),
            }]),
            ..ChatStreamDelta::default()
        }
    }

    #[test]
    fn streamed_tool_call_yields_start_delta_end() {
        let mut state = ChatStreamState::new();

        let mut chunks = state.convert_chunk(&chunk_with_delta(tool_delta(0, Some("call-1"), Some("lookup"), None), None));
        chunks.extend(state.convert_chunk(&chunk_with_delta(tool_delta(0, None, None, Some("{\"q\":")), None)));
        chunks.extend(state.convert_chunk(&chunk_with_delta(tool_delta(0, None, None, Some("\"x\"}")), None)));
        chunks.extend(state.convert_chunk(&chunk_with_delta(ChatStreamDelta::default(), Some("tool_calls"))));

        assert_eq!(
            chunks,
            vec![
                StreamChunk::ToolCallStart {
                    id: "call-1".to_owned(),
                    name: "lookup".to_owned(),
                },
                StreamChunk::ToolCallDelta {
                    id: "call-1".to_owned(),
                    arguments: "{\"q\":".to_owned(),
                },
                StreamChunk::ToolCallDelta {
                    id: "call-1".to_owned(),
                    arguments: "\"x\"}".to_owned(),
                },
                StreamChunk::ToolCallEnd {
                    id: "call-1".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn complete_call_suppressed_after_streamed_input() {
        let mut state = ChatStreamState::new();

        state.convert_chunk(&chunk_with_delta(tool_delta(0, Some("call-1"), Some("lookup"), None), None));
        state.convert_chunk(&chunk_with_delta(tool_delta(0, None, None, Some("{}")), None));

        // Vendor repeats the call in its complete, non-streamed form
        let duplicate =
            state.convert_chunk(&chunk_with_delta(tool_delta(0, Some("call-1"), Some("lookup"), Some("{}")), None));
        assert!(duplicate.is_empty());
    }

    #[test]
    fn complete_only_call_is_synthesized() {
        let mut state = ChatStreamState::new();

        let mut chunks =
            state.convert_chunk(&chunk_with_delta(tool_delta(0, Some("call-9"), Some("fetch"), Some("{}")), None));
        chunks.extend(state.finish());

        assert_eq!(
            chunks,
            vec![
                StreamChunk::ToolCallStart {
                    id: "call-9".to_owned(),
                    name: "fetch".to_owned(),
                },
                StreamChunk::ToolCallDelta {
                    id: "call-9".to_owned(),
                    arguments: "{}".to_owned(),
                },
                StreamChunk::ToolCallEnd {
                    id: "call-9".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn second_call_closes_the_first() {
        let mut state = ChatStreamState::new();

        state.convert_chunk(&chunk_with_delta(tool_delta(0, Some("call-1"), Some("a"), None), None));
        let chunks = state.convert_chunk(&chunk_with_delta(tool_delta(1, Some("call-2"), Some("b"), None), None));

        assert_eq!(chunks[0], StreamChunk::ToolCallEnd { id: "call-1".to_owned() });
        assert_eq!(
            chunks[1],
            StreamChunk::ToolCallStart {
                id: "call-2".to_owned(),
                name: "b".to_owned(),
            }
        );
    }

    #[test]
    fn reasoning_content_maps_to_reasoning_chunk() {
        let mut state = ChatStreamState::new();
        let delta = ChatStreamDelta {
            reasoning_content: Some("pondering".to_owned()),
            ..ChatStreamDelta::default()
        };
        assert_eq!(
            state.convert_chunk(&chunk_with_delta(delta, None)),
            vec![StreamChunk::Reasoning {
                text: "pondering".to_owned(),
                signature: None,
            }]
        );
    }

    #[test]
    fn usage_is_held_back_not_emitted_inline() {
        let mut state = ChatStreamState::new();
        let chunk = ChatStreamChunk {
            id: "chunk".to_owned(),
            choices: vec![],
            usage: Some(ChatUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                ..ChatUsage::default()
            }),
            error: None,
        };

        assert!(state.convert_chunk(&chunk).is_empty());
        assert_eq!(state.take_usage().unwrap().prompt_tokens, 10);
    }

    #[test]
    fn vendor_error_becomes_error_chunk() {
        let mut state = ChatStreamState::new();
        let chunk = ChatStreamChunk {
            id: String::new(),
            choices: vec![],
            usage: None,
            error: Some(crate::protocol::chat::ChatErrorDetail {
                message: "model overloaded".to_owned(),
                error_type: None,
                code: None,
            }),
        };
        assert_eq!(
            state.convert_chunk(&chunk),
            vec![StreamChunk::Error {
                message: "model overloaded".to_owned(),
            }]
        );
    }

    #[test]
    fn deepseek_cache_accounting_maps_to_cache_reads() {
        let usage = ChatUsage {
            prompt_tokens: 1000,
            completion_tokens: 100,
            prompt_cache_hit_tokens: Some(400),
            prompt_cache_miss_tokens: Some(600),
            ..ChatUsage::default()
        };
        let normalized = usage_from_wire(&usage, &ModelInfo::default());
        assert_eq!(normalized.cache_read_tokens, 400);
        assert_eq!(normalized.input_tokens, 1000);
    }

    #[test]
    fn reasoning_part_dropped_without_canonical_field() {
        let msg = Message::parts(
            Role::Assistant,
            vec![
                ContentPart::Reasoning {
                    text: "hidden".to_owned(),
                    signature: None,
                },
                ContentPart::Text {
                    text: "visible".to_owned(),
                },
            ],
        );

        let without = assistant_message_to_wire(&msg, false);
        assert!(without.reasoning_content.is_none());

        let with = assistant_message_to_wire(&msg, true);
        assert_eq!(with.reasoning_content.as_deref(), Some("hidden"));
    }

    #[test]
    fn response_reasoning_field_becomes_single_reasoning_part() {
        let wire = ChatChoiceMessage {
            role: "assistant".to_owned(),
            content: Some("answer".to_owned()),
            reasoning_content: Some("thought".to_owned()),
            tool_calls: None,
        };
        let msg = response_to_message(&wire);
        let parts = msg.content.parts();
        assert_eq!(parts.len(), 2);
        assert!(matches!(&parts[0], ContentPart::Reasoning { text, .. } if text == "thought"));
    }
}
