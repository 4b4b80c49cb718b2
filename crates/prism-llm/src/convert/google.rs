//! Conversion between internal types and the Google wire format

use crate::pricing;
use crate::protocol::google::{
    GoogleContent, GoogleFunctionCall, GoogleFunctionCallingConfig, GoogleFunctionDeclaration, GoogleFunctionResponse,
    GoogleGenerationConfig, GoogleInlineData, GooglePart, GoogleRequest, GoogleResponse, GoogleTool, GoogleToolConfig,
    GoogleUsageMetadata,
};
use crate::types::{
    CallMetadata, ContentPart, GroundingSource, Message, ModelInfo, Role, StreamChunk, TokenUsage, ToolChoice,
    ToolChoiceMode,
};

/// Build a `generateContent` request from internal messages
///
/// Google rejects consecutive same-role contents, so adjacent messages
/// mapping to the same role are merged into one multipart content.
pub fn build_google_request(
    system: &str,
    messages: &[Message],
    metadata: &CallMetadata,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
) -> GoogleRequest {
    let mut contents: Vec<GoogleContent> = Vec::with_capacity(messages.len());

    for msg in super::split_tool_results(messages) {
        let role = match msg.role {
            Role::Assistant => "model",
            // Google has no separate system or tool role inside contents
            Role::System | Role::User | Role::Tool => "user",
        };

        let parts: Vec<GooglePart> = msg.content.parts().iter().filter_map(part_to_google).collect();
        if parts.is_empty() {
            continue;
        }

        match contents.last_mut() {
            Some(last) if last.role.as_deref() == Some(role) => last.parts.extend(parts),
            _ => contents.push(GoogleContent {
                role: Some(role.to_owned()),
                parts,
            }),
        }
    }

    let tools = build_tool_declarations(metadata);

    GoogleRequest {
        contents,
        system_instruction: (!system.is_empty()).then(|| GoogleContent {
            role: None,
            parts: vec![GooglePart::text(system)],
        }),
        generation_config: Some(GoogleGenerationConfig {
            temperature,
            max_output_tokens: max_tokens,
        }),
        tools,
        tool_config: metadata.tool_choice.as_ref().map(tool_choice_to_google),
    }
}

/// Convert one internal content part; unrecognized shapes are dropped
fn part_to_google(part: &ContentPart) -> Option<GooglePart> {
    match part {
        ContentPart::Text { text } => Some(GooglePart::text(text.clone())),
        ContentPart::Image { url, .. } => {
            // Only inline data URIs can be carried; plain URLs are dropped
            let rest = url.strip_prefix("data:")?;
            let (mime_and_encoding, data) = rest.split_once(',')?;
            let mime_type = mime_and_encoding.strip_suffix(";base64").unwrap_or(mime_and_encoding);
            Some(GooglePart {
                inline_data: Some(GoogleInlineData {
                    mime_type: mime_type.to_owned(),
                    data: data.to_owned(),
                }),
                ..GooglePart::empty()
            })
        }
        ContentPart::ToolCall { name, arguments, .. } => {
            let args = serde_json::from_str(arguments).unwrap_or_else(|_| serde_json::json!({}));
            Some(GooglePart {
                function_call: Some(GoogleFunctionCall {
                    name: name.clone(),
                    args,
                }),
                ..GooglePart::empty()
            })
        }
        ContentPart::ToolResult { tool_call_id, content } => Some(GooglePart {
            function_response: Some(GoogleFunctionResponse {
                name: function_name_from_call_id(tool_call_id),
                response: serde_json::json!({ "result": content }),
            }),
            ..GooglePart::empty()
        }),
        ContentPart::Reasoning { text, signature } => Some(GooglePart {
            text: Some(text.clone()),
            thought: Some(true),
            thought_signature: signature.clone(),
            inline_data: None,
            function_call: None,
            function_response: None,
        }),
    }
}

/// Recover the function name from a synthesized call id
///
/// Google has no call ids, so this layer mints `{name}-{counter}` ids when
/// normalizing function calls; the suffix is stripped to get the name back.
fn function_name_from_call_id(id: &str) -> String {
    id.rsplit_once('-').map_or(id, |(name, _)| name).to_owned()
}

/// Build function declarations, filtering out non-function tools
fn build_tool_declarations(metadata: &CallMetadata) -> Option<Vec<GoogleTool>> {
    let declarations: Vec<GoogleFunctionDeclaration> = super::filter_function_tools(&metadata.tools)
        .into_iter()
        .map(|t| GoogleFunctionDeclaration {
            name: t.function.name.clone(),
            description: t.function.description.clone(),
            parameters: t.function.parameters.clone(),
        })
        .collect();

    (!declarations.is_empty()).then(|| {
        vec![GoogleTool {
            function_declarations: declarations,
        }]
    })
}

/// Convert internal tool choice to Google tool config
fn tool_choice_to_google(choice: &ToolChoice) -> GoogleToolConfig {
    let config = match choice {
        ToolChoice::Mode(mode) => GoogleFunctionCallingConfig {
            mode: match mode {
                ToolChoiceMode::None => "NONE",
                ToolChoiceMode::Auto => "AUTO",
                ToolChoiceMode::Required => "ANY",
            }
            .to_owned(),
            allowed_function_names: None,
        },
        ToolChoice::Function { name } => GoogleFunctionCallingConfig {
            mode: "ANY".to_owned(),
            allowed_function_names: Some(vec![name.clone()]),
        },
    };

    GoogleToolConfig {
        function_calling_config: config,
    }
}

/// Map usage metadata into normalized token usage with a derived cost
pub fn usage_from_metadata(metadata: &GoogleUsageMetadata, info: &ModelInfo) -> TokenUsage {
    let mut normalized = TokenUsage {
        input_tokens: metadata.prompt_token_count,
        output_tokens: metadata.candidates_token_count,
        cache_read_tokens: metadata.cached_content_token_count,
        cache_write_tokens: 0,
        reasoning_tokens: metadata.thoughts_token_count,
        total_cost: None,
    };
    normalized.total_cost = pricing::calculate_cost(info, &normalized);
    normalized
}

/// Stateful converter from Google stream chunks to normalized chunks
///
/// Google emits function calls complete rather than streamed, so each one
/// is synthesized into a start/delta/end triple with a minted call id.
#[derive(Debug, Default)]
pub struct GoogleStreamState {
    next_call: u32,
    usage: Option<GoogleUsageMetadata>,
}

impl GoogleStreamState {
    /// Create a fresh per-call stream state
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert one stream chunk into zero or more normalized chunks
    pub fn convert_chunk(&mut self, resp: &GoogleResponse) -> Vec<StreamChunk> {
        let mut out = Vec::new();

        for candidate in &resp.candidates {
            if let Some(content) = &candidate.content {
                for part in &content.parts {
                    self.convert_part(part, &mut out);
                }
            }

            if let Some(grounding) = &candidate.grounding_metadata {
                let sources: Vec<GroundingSource> = grounding
                    .grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .map(|web| GroundingSource {
                        url: web.uri.clone(),
                        title: web.title.clone(),
                    })
                    .collect();
                if !sources.is_empty() {
                    out.push(StreamChunk::Grounding { sources });
                }
            }
        }

        if let Some(usage) = &resp.usage_metadata {
            self.usage = Some(usage.clone());
        }

        out
    }

    /// Usage metadata reported by the vendor, if any arrived
    pub fn take_usage(&mut self) -> Option<GoogleUsageMetadata> {
        self.usage.take()
    }

    fn convert_part(&mut self, part: &GooglePart, out: &mut Vec<StreamChunk>) {
        if let Some(text) = &part.text
            && !text.is_empty()
        {
            if part.thought == Some(true) {
                out.push(StreamChunk::Reasoning {
                    text: text.clone(),
                    signature: part.thought_signature.clone(),
                });
            } else {
                out.push(StreamChunk::Text { text: text.clone() });
            }
        }

        if let Some(call) = &part.function_call {
            let id = format!("{}-{}", call.name, self.next_call);
            self.next_call += 1;

            out.push(StreamChunk::ToolCallStart {
                id: id.clone(),
                name: call.name.clone(),
            });
            out.push(StreamChunk::ToolCallDelta {
                id: id.clone(),
                arguments: call.args.to_string(),
            });
            out.push(StreamChunk::ToolCallEnd { id });
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::google::{GoogleCandidate, GoogleGroundingChunk, GoogleGroundingMetadata, GoogleGroundingWeb};

    use super::*;

    fn candidate_with_parts(parts: Vec<GooglePart>) -> GoogleResponse {
        GoogleResponse {
            candidates: vec![GoogleCandidate {
                content: Some(GoogleContent {
                    role: Some("model".to_owned()),
                    parts,
                }),
                finish_reason: None,
                grounding_metadata: None,
            }],
            usage_metadata: None,
        }
    }

    #[test]
    fn function_call_synthesizes_start_delta_end() {
        let mut state = GoogleStreamState::new();
        let resp = candidate_with_parts(vec![GooglePart {
            function_call: Some(GoogleFunctionCall {
                name: "lookup".to_owned(),
                args: serde_json::json!({"q": "x"}),
            }),
            ..GooglePart::empty()
        }]);

        let chunks = state.convert_chunk(&resp);
        assert_eq!(chunks.len(), 3);
        assert!(matches!(&chunks[0], StreamChunk::ToolCallStart { id, name } if id == "lookup-0" && name == "lookup"));
        assert!(matches!(&chunks[2], StreamChunk::ToolCallEnd { id } if id == "lookup-0"));
    }

    #[test]
    fn thought_parts_become_reasoning() {
        let mut state = GoogleStreamState::new();
        let resp = candidate_with_parts(vec![GooglePart {
            text: Some("mulling it over".to_owned()),
            thought: Some(true),
            thought_signature: Some("sig".to_owned()),
            inline_data: None,
            function_call: None,
            function_response: None,
        }]);

        assert_eq!(
            state.convert_chunk(&resp),
            vec![StreamChunk::Reasoning {
                text: "mulling it over".to_owned(),
                signature: Some("sig".to_owned()),
            }]
        );
    }

    #[test]
    fn grounding_chunks_surface_as_sources() {
        let mut state = GoogleStreamState::new();
        let resp = GoogleResponse {
            candidates: vec![GoogleCandidate {
                content: None,
                finish_reason: Some("STOP".to_owned()),
                grounding_metadata: Some(GoogleGroundingMetadata {
                    grounding_chunks: vec![GoogleGroundingChunk {
                        web: Some(GoogleGroundingWeb {
                            uri: "https://example.com".to_owned(),
                            title: Some("Example".to_owned()),
                        }),
                    }],
                }),
            }],
            usage_metadata: None,
        };

        let chunks = state.convert_chunk(&resp);
        assert_eq!(
            chunks,
            vec![StreamChunk::Grounding {
                sources: vec![GroundingSource {
                    url: "https://example.com".to_owned(),
                    title: Some("Example".to_owned()),
                }],
            }]
        );
    }

    #[test]
    fn call_id_round_trips_to_function_name() {
        assert_eq!(function_name_from_call_id("lookup-0"), "lookup");
        assert_eq!(function_name_from_call_id("no_separator"), "no_separator");
    }

    #[test]
    fn consecutive_user_messages_merge_into_one_content() {
        let messages = vec![
            Message::text(Role::User, "first"),
            Message::text(Role::User, "second"),
        ];
        let request = build_google_request("", &messages, &CallMetadata::default(), None, None);
        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].parts.len(), 2);
    }

    #[test]
    fn usage_counts_thoughts_separately() {
        let metadata = GoogleUsageMetadata {
            prompt_token_count: 100,
            candidates_token_count: 40,
            thoughts_token_count: 60,
            cached_content_token_count: 25,
        };
        let usage = usage_from_metadata(&metadata, &ModelInfo::default());
        assert_eq!(usage.output_tokens, 40);
        assert_eq!(usage.reasoning_tokens, 60);
        assert_eq!(usage.cache_read_tokens, 25);
    }
}
