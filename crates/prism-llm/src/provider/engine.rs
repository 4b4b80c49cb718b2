//! Shared request engine for OpenAI-compatible vendors
//!
//! Owns the HTTP client, SSE decoding, stream normalization, and the
//! error taxonomy; vendor handlers supply the base URL, model table, and
//! quirks.

use std::collections::VecDeque;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use prism_config::ProviderConfig;
use prism_telemetry::Reporter;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::convert::chat::{ChatRequestParams, ChatStreamState, build_chat_request, usage_from_wire};
use crate::convert::reasoning::ThinkTagParser;
use crate::error::{LlmError, from_transport, wrap_provider_error};
use crate::protocol::chat::{ChatErrorResponse, ChatRequest, ChatResponse, ChatStreamChunk};
use crate::types::{CallMetadata, Message, PromptOptions, ResolvedModel, Role, StreamChunk};

use super::ChunkStream;

/// Per-vendor behavior the shared engine parameterizes over
#[derive(Debug, Clone, Copy)]
pub(crate) struct EngineQuirks {
    /// Display name used in wrapped errors and logs
    pub provider: &'static str,
    /// Whether the vendor has a canonical `reasoning_content` field
    pub reasoning_field: bool,
    /// Model-id predicate selecting the inline `<think>` extraction path
    pub think_tags: Option<fn(&str) -> bool>,
}

/// Shared OpenAI-compatible chat engine
pub(crate) struct ChatEngine {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    quirks: EngineQuirks,
    reporter: Reporter,
}

impl ChatEngine {
    /// Build an engine from provider configuration
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (should never
    /// happen).
    pub fn from_config(
        config: &ProviderConfig,
        default_base_url: &str,
        model: &ResolvedModel,
        quirks: EngineQuirks,
        reporter: Reporter,
    ) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| Url::parse(default_base_url).expect("valid default URL"));

        Self {
            client: Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            temperature: config.temperature.or(model.info.default_temperature),
            max_tokens: config.max_tokens.or(model.info.max_tokens),
            quirks,
            reporter,
        }
    }

    /// Build the chat completions URL
    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    /// Issue a request, mapping failures into the error taxonomy
    async fn send(&self, request: &ChatRequest, cancel: &CancellationToken) -> Result<reqwest::Response, LlmError> {
        if cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }

        let mut builder = self.client.post(self.completions_url()).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = tokio::select! {
            () = cancel.cancelled() => return Err(LlmError::Cancelled),
            result = builder.send() => {
                result.map_err(|e| from_transport(self.quirks.provider, e, &*self.reporter))?
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let (message, error_name) = parse_error_body(&body);
            return Err(wrap_provider_error(
                self.quirks.provider,
                Some(status),
                error_name.as_deref(),
                message,
                None,
                &*self.reporter,
            ));
        }

        Ok(response)
    }

    /// Begin a streaming generation
    pub async fn stream_chat(
        &self,
        model: &ResolvedModel,
        system: &str,
        messages: &[Message],
        metadata: &CallMetadata,
    ) -> Result<ChunkStream, LlmError> {
        let request = build_chat_request(
            model,
            system,
            messages,
            metadata,
            ChatRequestParams {
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                stream: true,
                reasoning_field: self.quirks.reasoning_field,
            },
        );

        if let Some(task_id) = &metadata.task_id {
            tracing::debug!(provider = %self.quirks.provider, task_id = %task_id, model = %model.id, "starting stream");
        }

        let response = self.send(&request, &metadata.cancel).await?;

        let parser = self
            .quirks
            .think_tags
            .filter(|matches| matches(&model.id))
            .map(|_| ThinkTagParser::new());

        Ok(normalize_sse(response, model.info.clone(), parser))
    }

    /// One-shot completion with no streaming
    pub async fn chat(
        &self,
        model: &ResolvedModel,
        prompt: &str,
        options: &PromptOptions,
    ) -> Result<String, LlmError> {
        let messages = [Message::text(Role::User, prompt)];
        let request = build_chat_request(
            model,
            options.system.as_deref().unwrap_or(""),
            &messages,
            &CallMetadata::default(),
            ChatRequestParams {
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                stream: false,
                reasoning_field: self.quirks.reasoning_field,
            },
        );

        let response = self.send(&request, &options.cancel).await?;

        let wire: ChatResponse = tokio::select! {
            () = options.cancel.cancelled() => return Err(LlmError::Cancelled),
            result = response.json::<ChatResponse>() => result.map_err(|e| {
                wrap_provider_error(
                    self.quirks.provider,
                    None,
                    None,
                    format!("failed to parse response: {e}"),
                    Some(Box::new(e)),
                    &*self.reporter,
                )
            })?,
        };

        Ok(wire
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

/// Extract the message and error name from a vendor error body
///
/// Non-JSON bodies are coerced to a message string rather than causing a
/// secondary failure.
fn parse_error_body(body: &str) -> (String, Option<String>) {
    serde_json::from_str::<ChatErrorResponse>(body).map_or_else(
        |_| (body.to_owned(), None),
        |parsed| (parsed.error.message, parsed.error.error_type),
    )
}

/// State threaded through the SSE normalization loop
struct SseContext {
    events: futures_util::stream::BoxStream<
        'static,
        Result<eventsource_stream::Event, eventsource_stream::EventStreamError<reqwest::Error>>,
    >,
    state: ChatStreamState,
    parser: Option<ThinkTagParser>,
    model_info: crate::types::ModelInfo,
    pending: VecDeque<Result<StreamChunk, LlmError>>,
    done: bool,
}

/// Normalize an SSE response into a chunk stream
///
/// The usage chunk is emitted exactly once, after every other chunk, even
/// when the vendor reported usage mid-stream or not at all.
fn normalize_sse(
    response: reqwest::Response,
    model_info: crate::types::ModelInfo,
    parser: Option<ThinkTagParser>,
) -> ChunkStream {
    let ctx = SseContext {
        events: response.bytes_stream().eventsource().boxed(),
        state: ChatStreamState::new(),
        parser,
        model_info,
        pending: VecDeque::new(),
        done: false,
    };

    Box::pin(futures_util::stream::unfold(ctx, |mut ctx| async move {
        loop {
            if let Some(item) = ctx.pending.pop_front() {
                return Some((item, ctx));
            }
            if ctx.done {
                return None;
            }

            match ctx.events.next().await {
                Some(Ok(event)) => {
                    let data = event.data.trim();
                    if data.is_empty() || data == "[DONE]" {
                        continue;
                    }
                    match serde_json::from_str::<ChatStreamChunk>(data) {
                        Ok(chunk) => {
                            for normalized in ctx.state.convert_chunk(&chunk) {
                                enqueue(&mut ctx.pending, &mut ctx.parser, normalized);
                            }
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "skipping unparseable SSE event");
                        }
                    }
                }
                Some(Err(e)) => {
                    ctx.pending.push_back(Err(LlmError::Streaming(e.to_string())));
                }
                None => {
                    ctx.done = true;
                    let trailing: Vec<StreamChunk> = ctx
                        .parser
                        .as_mut()
                        .map(ThinkTagParser::finish)
                        .unwrap_or_default()
                        .into_iter()
                        .chain(ctx.state.finish())
                        .collect();
                    for chunk in trailing {
                        ctx.pending.push_back(Ok(chunk));
                    }

                    let usage = ctx
                        .state
                        .take_usage()
                        .map(|u| usage_from_wire(&u, &ctx.model_info))
                        .unwrap_or_default();
                    ctx.pending.push_back(Ok(StreamChunk::Usage(usage)));
                }
            }
        }
    }))
}

/// Queue one normalized chunk, routing text through the tag parser
fn enqueue(
    pending: &mut VecDeque<Result<StreamChunk, LlmError>>,
    parser: &mut Option<ThinkTagParser>,
    chunk: StreamChunk,
) {
    match (parser, chunk) {
        (Some(parser), StreamChunk::Text { text }) => {
            for split in parser.push(&text) {
                pending.push_back(Ok(split));
            }
        }
        (_, chunk) => pending.push_back(Ok(chunk)),
    }
}
