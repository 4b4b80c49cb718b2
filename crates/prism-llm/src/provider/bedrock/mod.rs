//! AWS Bedrock provider implementation using the Converse API

mod arn;
mod cache;
mod models;

use std::collections::VecDeque;

use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use aws_sdk_bedrockruntime::error::ProvideErrorMetadata;
use aws_sdk_bedrockruntime::types::{
    AnyToolChoice, AutoToolChoice, CachePointBlock, CachePointType, ContentBlock, ContentBlockDelta,
    ContentBlockStart, ConversationRole, ConverseOutput, ConverseStreamOutput, ImageBlock, ImageFormat, ImageSource,
    InferenceConfiguration, Message as BedrockMessage, ReasoningContentBlock, ReasoningContentBlockDelta,
    ReasoningTextBlock, SpecificToolChoice, SystemContentBlock, Tool, ToolChoice as BedrockToolChoice,
    ToolConfiguration, ToolInputSchema, ToolResultBlock, ToolResultContentBlock, ToolSpecification, ToolUseBlock,
};
use prism_config::{BedrockConfig, ProviderConfig};
use prism_telemetry::Reporter;
use secrecy::ExposeSecret;

use super::{ChunkStream, Provider};
use crate::convert::split_tool_results;
use crate::error::{LlmError, wrap_provider_error};
use crate::pricing;
use crate::types::{
    CallMetadata, Content, ContentPart, Message, PromptOptions, ResolvedModel, Role, StreamChunk, TokenUsage,
    ToolChoice, ToolChoiceMode,
};

pub use arn::{ParsedArn, cross_region_prefix_for, parse_model_arn};
pub use cache::{MAX_CACHE_POINTS, cache_point_indices};
pub use models::DEFAULT_MODEL;

/// AWS Bedrock handler
///
/// Holds configuration only; reasoning-signature capture lives in the
/// per-call stream state, so one handler instance can serve concurrent
/// calls.
pub struct BedrockProvider {
    client: BedrockClient,
    model: ResolvedModel,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    prompt_cache: bool,
    reporter: Reporter,
}

impl BedrockProvider {
    /// Create from provider configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` when the bedrock settings table is
    /// absent or a configured custom ARN cannot be parsed.
    pub async fn new(config: &ProviderConfig, reporter: Reporter) -> Result<Self, LlmError> {
        let Some(bedrock) = &config.bedrock else {
            return Err(LlmError::Config("bedrock provider requires a bedrock table".to_owned()));
        };

        let model = resolve_model(config.model.as_deref(), bedrock)?;
        let client = build_bedrock_client(bedrock).await;

        Ok(Self {
            client,
            model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            prompt_cache: bedrock.prompt_cache,
            reporter,
        })
    }

    fn inference_config(&self) -> InferenceConfiguration {
        let mut builder = InferenceConfiguration::builder();

        if let Some(temperature) = self.temperature {
            #[allow(clippy::cast_possible_truncation)]
            {
                builder = builder.temperature(temperature as f32);
            }
        }

        let max_tokens = self.max_tokens.or(self.model.info.max_tokens);
        if let Some(max_tokens) = max_tokens {
            builder = builder.max_tokens(i32::try_from(max_tokens).unwrap_or(i32::MAX));
        }

        builder.build()
    }
}

/// Resolve the request model id and its info from configuration
///
/// A custom ARN overrides the model id entirely: the ARN itself is sent
/// to the API while its embedded id drives info lookup. Otherwise the
/// configured (or default) id is used, with a cross-region
/// inference-profile prefix applied when enabled.
fn resolve_model(configured: Option<&str>, bedrock: &BedrockConfig) -> Result<ResolvedModel, LlmError> {
    if let Some(custom_arn) = &bedrock.custom_arn {
        let Some(parsed) = parse_model_arn(custom_arn) else {
            return Err(LlmError::Config(format!("invalid bedrock ARN: {custom_arn}")));
        };

        if let Some(arn_region) = &parsed.region
            && *arn_region != bedrock.region
        {
            tracing::warn!(
                arn_region = %arn_region,
                configured_region = %bedrock.region,
                "bedrock ARN region differs from configured region"
            );
        }

        return Ok(ResolvedModel {
            id: custom_arn.clone(),
            info: models::find_model_info(parsed.base_model_id()),
        });
    }

    let base_id = configured.unwrap_or(DEFAULT_MODEL);
    let info = models::find_model_info(base_id);

    let id = if bedrock.cross_region_inference {
        match cross_region_prefix_for(&bedrock.region) {
            Some(prefix) if !base_id.starts_with(prefix) => format!("{prefix}{base_id}"),
            _ => base_id.to_owned(),
        }
    } else {
        base_id.to_owned()
    };

    Ok(ResolvedModel { id, info })
}

/// Build a Bedrock runtime client from configuration
async fn build_bedrock_client(config: &BedrockConfig) -> BedrockClient {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()));

    // Use explicit credentials if provided, otherwise fall back to default chain
    if let (Some(access_key), Some(secret_key)) = (&config.access_key_id, &config.secret_access_key) {
        let credentials = aws_credential_types::Credentials::new(
            access_key.expose_secret(),
            secret_key.expose_secret(),
            config.session_token.as_ref().map(|t| t.expose_secret().to_owned()),
            None,
            "prism-config",
        );
        loader = loader.credentials_provider(credentials);
    }

    if config.endpoint_enabled
        && let Some(endpoint) = &config.endpoint_url
    {
        loader = loader.endpoint_url(endpoint.as_str());
    }

    let aws_config = loader.load().await;
    BedrockClient::new(&aws_config)
}

/// Map an SDK failure into the error taxonomy
///
/// The service error code carries names like `ThrottlingException`, which
/// the throttling predicate matches on.
fn map_sdk_error<E>(err: &E, reporter: &Reporter) -> LlmError
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    let code = err.code().map(ToOwned::to_owned);
    let message = err.message().map_or_else(|| err.to_string(), ToOwned::to_owned);
    wrap_provider_error("Bedrock", None, code.as_deref(), message, None, &**reporter)
}

#[async_trait]
impl Provider for BedrockProvider {
    fn name(&self) -> &'static str {
        "Bedrock"
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
        if metadata.cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }

        let cache_enabled = self.prompt_cache && self.model.info.supports_prompt_cache;
        let (system_blocks, bedrock_messages) = build_converse_input(system, messages, cache_enabled)?;

        let mut converse = self
            .client
            .converse_stream()
            .model_id(&self.model.id)
            .set_system(Some(system_blocks))
            .set_messages(Some(bedrock_messages))
            .inference_config(self.inference_config());

        if let Some(tool_config) = build_tool_config(metadata) {
            converse = converse.tool_config(tool_config);
        }

        let output = tokio::select! {
            () = metadata.cancel.cancelled() => return Err(LlmError::Cancelled),
            result = converse.send() => result.map_err(|e| map_sdk_error(&e, &self.reporter))?,
        };

        Ok(normalize_converse_stream(output.stream, self.model.info.clone()))
    }

    async fn complete_prompt(&self, prompt: &str, options: &PromptOptions) -> Result<String, LlmError> {
        if options.cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }

        let messages = [Message::text(Role::User, prompt)];
        let (system_blocks, bedrock_messages) =
            build_converse_input(options.system.as_deref().unwrap_or(""), &messages, false)?;

        let converse = self
            .client
            .converse()
            .model_id(&self.model.id)
            .set_system(Some(system_blocks))
            .set_messages(Some(bedrock_messages))
            .inference_config(self.inference_config());

        let output = tokio::select! {
            () = options.cancel.cancelled() => return Err(LlmError::Cancelled),
            result = converse.send() => result.map_err(|e| map_sdk_error(&e, &self.reporter))?,
        };

        let text = match output.output() {
            Some(ConverseOutput::Message(msg)) => msg
                .content()
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text(t) => Some(t.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(""),
            _ => String::new(),
        };

        Ok(text)
    }
}

/// Per-call state for converting the Converse event stream
///
/// The reasoning signature and open tool id are scoped here rather than
/// on the handler, so concurrent calls never observe each other.
#[derive(Default)]
struct ConverseStreamState {
    open_tool: Option<String>,
    usage: Option<TokenUsage>,
    pending: VecDeque<Result<StreamChunk, LlmError>>,
    done: bool,
}

/// Normalize the Converse event stream into a chunk stream
///
/// Lifecycle events are dropped; the usage chunk is emitted exactly once,
/// after every other chunk.
fn normalize_converse_stream(
    receiver: aws_sdk_bedrockruntime::primitives::event_stream::EventReceiver<
        ConverseStreamOutput,
        aws_sdk_bedrockruntime::types::error::ConverseStreamOutputError,
    >,
    model_info: crate::types::ModelInfo,
) -> ChunkStream {
    let state = ConverseStreamState::default();

    Box::pin(futures_util::stream::unfold(
        (receiver, state, model_info),
        |(mut receiver, mut state, model_info)| async move {
            loop {
                if let Some(item) = state.pending.pop_front() {
                    return Some((item, (receiver, state, model_info)));
                }
                if state.done {
                    return None;
                }

                match receiver.recv().await {
                    Ok(Some(event)) => convert_converse_event(&event, &mut state, &model_info),
                    Ok(None) => {
                        state.done = true;
                        if let Some(id) = state.open_tool.take() {
                            state.pending.push_back(Ok(StreamChunk::ToolCallEnd { id }));
                        }
                        let usage = state.usage.take().unwrap_or_default();
                        state.pending.push_back(Ok(StreamChunk::Usage(usage)));
                    }
                    Err(e) => {
                        state.pending.push_back(Err(LlmError::Streaming(e.to_string())));
                    }
                }
            }
        },
    ))
}

/// Convert one Converse stream event into pending normalized chunks
fn convert_converse_event(
    event: &ConverseStreamOutput,
    state: &mut ConverseStreamState,
    model_info: &crate::types::ModelInfo,
) {
    match event {
        ConverseStreamOutput::ContentBlockStart(start) => {
            if let Some(ContentBlockStart::ToolUse(tool)) = start.start() {
                let id = tool.tool_use_id().to_owned();
                state.open_tool = Some(id.clone());
                state.pending.push_back(Ok(StreamChunk::ToolCallStart {
                    id,
                    name: tool.name().to_owned(),
                }));
            }
        }
        ConverseStreamOutput::ContentBlockDelta(delta) => match delta.delta() {
            Some(ContentBlockDelta::Text(text)) => {
                state.pending.push_back(Ok(StreamChunk::Text { text: text.clone() }));
            }
            Some(ContentBlockDelta::ToolUse(tool)) => {
                let id = state.open_tool.clone().unwrap_or_default();
                state.pending.push_back(Ok(StreamChunk::ToolCallDelta {
                    id,
                    arguments: tool.input().to_owned(),
                }));
            }
            Some(ContentBlockDelta::ReasoningContent(reasoning)) => match reasoning {
                ReasoningContentBlockDelta::Text(text) => {
                    state.pending.push_back(Ok(StreamChunk::Reasoning {
                        text: text.clone(),
                        signature: None,
                    }));
                }
                ReasoningContentBlockDelta::Signature(signature) => {
                    state.pending.push_back(Ok(StreamChunk::Reasoning {
                        text: String::new(),
                        signature: Some(signature.clone()),
                    }));
                }
                _ => {}
            },
            _ => {}
        },
        ConverseStreamOutput::ContentBlockStop(_) => {
            if let Some(id) = state.open_tool.take() {
                state.pending.push_back(Ok(StreamChunk::ToolCallEnd { id }));
            }
        }
        ConverseStreamOutput::Metadata(metadata) => {
            if let Some(usage) = metadata.usage() {
                let to_u64 = |v: i32| u64::try_from(v).unwrap_or_default();
                let cache_read_tokens = usage.cache_read_input_tokens().map_or(0, to_u64);
                let cache_write_tokens = usage.cache_write_input_tokens().map_or(0, to_u64);

                // Converse reports cached tokens separately from inputTokens;
                // normalize to the inclusive convention the calculator expects
                let mut normalized = TokenUsage {
                    input_tokens: to_u64(usage.input_tokens()) + cache_read_tokens + cache_write_tokens,
                    output_tokens: to_u64(usage.output_tokens()),
                    cache_read_tokens,
                    cache_write_tokens,
                    reasoning_tokens: 0,
                    total_cost: None,
                };
                normalized.total_cost = pricing::calculate_cost(model_info, &normalized);
                state.usage = Some(normalized);
            }
        }
        // MessageStart, MessageStop and unknown events are lifecycle markers
        _ => {}
    }
}

/// Build Converse system blocks and messages from internal messages
fn build_converse_input(
    system: &str,
    messages: &[Message],
    cache_enabled: bool,
) -> Result<(Vec<SystemContentBlock>, Vec<BedrockMessage>), LlmError> {
    let mut system_blocks = Vec::new();
    if !system.is_empty() {
        system_blocks.push(SystemContentBlock::Text(system.to_owned()));
    }

    let split = split_tool_results(messages);
    let cache_indices = if cache_enabled {
        cache_point_indices(&split)
    } else {
        Vec::new()
    };

    let mut bedrock_messages = Vec::with_capacity(split.len());

    for (i, msg) in split.iter().enumerate() {
        let (role, mut blocks) = match msg.role {
            Role::System => {
                system_blocks.push(SystemContentBlock::Text(msg.content.as_text()));
                continue;
            }
            Role::Tool => (ConversationRole::User, build_tool_result_blocks(msg)?),
            Role::User => (ConversationRole::User, build_content_blocks(msg)),
            Role::Assistant => (ConversationRole::Assistant, build_content_blocks(msg)),
        };

        if blocks.is_empty() {
            blocks.push(ContentBlock::Text(String::new()));
        }

        if cache_indices.contains(&i)
            && let Ok(point) = CachePointBlock::builder().r#type(CachePointType::Default).build()
        {
            blocks.push(ContentBlock::CachePoint(point));
        }

        if let Ok(bedrock_msg) = BedrockMessage::builder().role(role).set_content(Some(blocks)).build() {
            bedrock_messages.push(bedrock_msg);
        }
    }

    Ok((system_blocks, bedrock_messages))
}

/// Build the tool-result blocks for a tool-role message
fn build_tool_result_blocks(msg: &Message) -> Result<Vec<ContentBlock>, LlmError> {
    let mut blocks = Vec::new();

    for part in msg.content.parts() {
        if let ContentPart::ToolResult { tool_call_id, content } = part {
            let result = ToolResultBlock::builder()
                .tool_use_id(tool_call_id)
                .content(ToolResultContentBlock::Text(content))
                .build()
                .map_err(|e| LlmError::InvalidRequest(format!("invalid tool result: {e}")))?;
            blocks.push(ContentBlock::ToolResult(result));
        }
    }

    Ok(blocks)
}

/// Build Converse content blocks from a user or assistant message
///
/// Unrepresentable parts (non-data-URI images, malformed blocks) are
/// silently dropped.
fn build_content_blocks(msg: &Message) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();

    let parts = match &msg.content {
        Content::Text(text) => {
            if !text.is_empty() {
                blocks.push(ContentBlock::Text(text.clone()));
            }
            return blocks;
        }
        Content::Parts(parts) => parts,
    };

    for part in parts {
        match part {
            ContentPart::Text { text } => {
                if !text.is_empty() {
                    blocks.push(ContentBlock::Text(text.clone()));
                }
            }
            ContentPart::Image { url, .. } => {
                if let Some(block) = build_image_block(url) {
                    blocks.push(ContentBlock::Image(block));
                }
            }
            ContentPart::ToolCall { id, name, arguments } => {
                let input = serde_json::from_str::<serde_json::Value>(arguments)
                    .unwrap_or_else(|_| serde_json::json!({}));
                if let Ok(tool_use) = ToolUseBlock::builder()
                    .tool_use_id(id)
                    .name(name)
                    .input(value_to_document(&input))
                    .build()
                {
                    blocks.push(ContentBlock::ToolUse(tool_use));
                }
            }
            ContentPart::Reasoning { text, signature } => {
                let mut builder = ReasoningTextBlock::builder().text(text);
                if let Some(signature) = signature {
                    builder = builder.signature(signature);
                }
                if let Ok(block) = builder.build() {
                    blocks.push(ContentBlock::ReasoningContent(ReasoningContentBlock::ReasoningText(
                        block,
                    )));
                }
            }
            // Tool results are hoisted into tool-role messages beforehand
            ContentPart::ToolResult { .. } => {}
        }
    }

    blocks
}

/// Parse a data URI into an inline image block
fn build_image_block(url: &str) -> Option<ImageBlock> {
    let rest = url.strip_prefix("data:")?;
    let (mime_and_encoding, data) = rest.split_once(',')?;
    let format = mime_and_encoding.strip_suffix(";base64").unwrap_or(mime_and_encoding);

    let image_format = match format {
        "image/png" => ImageFormat::Png,
        "image/gif" => ImageFormat::Gif,
        "image/webp" => ImageFormat::Webp,
        _ => ImageFormat::Jpeg,
    };

    let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, data).ok()?;

    ImageBlock::builder()
        .format(image_format)
        .source(ImageSource::Bytes(aws_smithy_types::Blob::new(bytes)))
        .build()
        .ok()
}

/// Build tool configuration from call metadata
fn build_tool_config(metadata: &CallMetadata) -> Option<ToolConfiguration> {
    let tools: Vec<Tool> = crate::convert::filter_function_tools(&metadata.tools)
        .into_iter()
        .filter_map(|t| {
            let input_schema = t.function.parameters.as_ref().map_or_else(
                || ToolInputSchema::Json(aws_smithy_types::Document::Object(std::collections::HashMap::new())),
                |p| ToolInputSchema::Json(value_to_document(p)),
            );

            let mut builder = ToolSpecification::builder()
                .name(&t.function.name)
                .input_schema(input_schema);

            if let Some(description) = &t.function.description {
                builder = builder.description(description);
            }

            Some(Tool::ToolSpec(builder.build().ok()?))
        })
        .collect();

    if tools.is_empty() {
        return None;
    }

    let mut config = ToolConfiguration::builder();
    for tool in tools {
        config = config.tools(tool);
    }

    if let Some(choice) = metadata.tool_choice.as_ref().and_then(tool_choice_to_bedrock) {
        config = config.tool_choice(choice);
    }

    config.build().ok()
}

/// Map internal tool choice onto Bedrock's tool choice
///
/// Bedrock has no "none" mode; that case omits the field entirely.
fn tool_choice_to_bedrock(choice: &ToolChoice) -> Option<BedrockToolChoice> {
    match choice {
        ToolChoice::Mode(ToolChoiceMode::None) => None,
        ToolChoice::Mode(ToolChoiceMode::Auto) => {
            Some(BedrockToolChoice::Auto(AutoToolChoice::builder().build()))
        }
        ToolChoice::Mode(ToolChoiceMode::Required) => {
            Some(BedrockToolChoice::Any(AnyToolChoice::builder().build()))
        }
        ToolChoice::Function { name } => SpecificToolChoice::builder()
            .name(name)
            .build()
            .ok()
            .map(BedrockToolChoice::Tool),
    }
}

/// Convert a `serde_json::Value` to an AWS `Document`
fn value_to_document(value: &serde_json::Value) -> aws_smithy_types::Document {
    match value {
        serde_json::Value::Null => aws_smithy_types::Document::Null,
        serde_json::Value::Bool(b) => aws_smithy_types::Document::Bool(*b),
        #[allow(clippy::cast_precision_loss)]
        serde_json::Value::Number(n) => n.as_i64().map_or_else(
            || {
                n.as_f64().map_or(aws_smithy_types::Document::Null, |f| {
                    aws_smithy_types::Document::Number(aws_smithy_types::Number::Float(f))
                })
            },
            |i| aws_smithy_types::Document::Number(aws_smithy_types::Number::Float(i as f64)),
        ),
        serde_json::Value::String(s) => aws_smithy_types::Document::String(s.clone()),
        serde_json::Value::Array(arr) => {
            aws_smithy_types::Document::Array(arr.iter().map(value_to_document).collect())
        }
        serde_json::Value::Object(map) => {
            let object: std::collections::HashMap<String, aws_smithy_types::Document> =
                map.iter().map(|(k, v)| (k.clone(), value_to_document(v))).collect();
            aws_smithy_types::Document::Object(object)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bedrock_config() -> BedrockConfig {
        BedrockConfig {
            region: "us-east-1".to_owned(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            custom_arn: None,
            cross_region_inference: false,
            prompt_cache: false,
            endpoint_url: None,
            endpoint_enabled: false,
        }
    }

    #[test]
    fn default_model_when_unconfigured() {
        let model = resolve_model(None, &bedrock_config()).unwrap();
        assert_eq!(model.id, DEFAULT_MODEL);
        assert!(model.info.supports_prompt_cache);
    }

    #[test]
    fn cross_region_inference_prefixes_the_id() {
        let config = BedrockConfig {
            cross_region_inference: true,
            ..bedrock_config()
        };
        let model = resolve_model(None, &config).unwrap();
        assert_eq!(model.id, format!("us.{DEFAULT_MODEL}"));
    }

    #[test]
    fn custom_arn_is_sent_verbatim_with_guessed_info() {
        let arn = "arn:aws:bedrock:us-east-1:123:inference-profile/us.anthropic.claude-3-5-sonnet-20241022-v2:0";
        let config = BedrockConfig {
            custom_arn: Some(arn.to_owned()),
            ..bedrock_config()
        };
        let model = resolve_model(None, &config).unwrap();
        assert_eq!(model.id, arn);
        assert_eq!(model.info.input_price, Some(3.0));
    }

    #[test]
    fn malformed_custom_arn_is_a_config_error() {
        let config = BedrockConfig {
            custom_arn: Some("not-an-arn".to_owned()),
            ..bedrock_config()
        };
        assert!(matches!(resolve_model(None, &config), Err(LlmError::Config(_))));
    }

    #[test]
    fn cache_points_land_on_user_messages() {
        let messages = vec![
            Message::text(Role::User, "first question"),
            Message::text(Role::Assistant, "first answer"),
            Message::text(Role::User, "second question"),
        ];
        let (_, bedrock_messages) = build_converse_input("system", &messages, true).unwrap();

        let cached: Vec<bool> = bedrock_messages
            .iter()
            .map(|m| m.content().iter().any(|b| matches!(b, ContentBlock::CachePoint(_))))
            .collect();
        assert_eq!(cached, vec![true, false, true]);
    }

    #[test]
    fn tool_results_become_user_tool_result_blocks() {
        let messages = vec![Message::parts(
            Role::User,
            vec![ContentPart::ToolResult {
                tool_call_id: "call-1".to_owned(),
                content: "42".to_owned(),
            }],
        )];
        let (_, bedrock_messages) = build_converse_input("", &messages, false).unwrap();
        assert_eq!(bedrock_messages.len(), 1);
        assert_eq!(bedrock_messages[0].role(), &ConversationRole::User);
        assert!(matches!(bedrock_messages[0].content()[0], ContentBlock::ToolResult(_)));
    }

    #[test]
    fn reasoning_parts_replay_with_signature() {
        let messages = vec![Message::parts(
            Role::Assistant,
            vec![ContentPart::Reasoning {
                text: "prior thinking".to_owned(),
                signature: Some("sig".to_owned()),
            }],
        )];
        let (_, bedrock_messages) = build_converse_input("", &messages, false).unwrap();
        assert!(matches!(
            bedrock_messages[0].content()[0],
            ContentBlock::ReasoningContent(_)
        ));
    }
}
