//! Shared request plumbing for the Google-format providers
//!
//! Gemini and Vertex speak the same `generateContent` surface from
//! different hosts with different authentication; the SSE normalization
//! and error mapping live here.

use std::collections::VecDeque;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use prism_telemetry::Reporter;
use tokio_util::sync::CancellationToken;

use crate::convert::google::{GoogleStreamState, usage_from_metadata};
use crate::error::{LlmError, from_transport, wrap_provider_error};
use crate::protocol::google::{GoogleErrorResponse, GoogleResponse};
use crate::types::{ModelInfo, StreamChunk};

use super::ChunkStream;

/// Issue a prepared request, mapping failures into the error taxonomy
pub(crate) async fn send(
    builder: reqwest::RequestBuilder,
    provider: &'static str,
    cancel: &CancellationToken,
    reporter: &Reporter,
) -> Result<reqwest::Response, LlmError> {
    if cancel.is_cancelled() {
        return Err(LlmError::Cancelled);
    }

    let response = tokio::select! {
        () = cancel.cancelled() => return Err(LlmError::Cancelled),
        result = builder.send() => result.map_err(|e| from_transport(provider, e, &**reporter))?,
    };

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let (message, error_name) = parse_error_body(&body);
        return Err(wrap_provider_error(
            provider,
            Some(status),
            error_name.as_deref(),
            message,
            None,
            &**reporter,
        ));
    }

    Ok(response)
}

/// Extract the message and status name from a Google error body
fn parse_error_body(body: &str) -> (String, Option<String>) {
    serde_json::from_str::<GoogleErrorResponse>(body).map_or_else(
        |_| (body.to_owned(), None),
        |parsed| (parsed.error.message, parsed.error.status),
    )
}

/// Parse a one-shot response body into answer text
///
/// Thought parts are excluded; only answer text is joined.
pub(crate) async fn complete(
    response: reqwest::Response,
    provider: &'static str,
    cancel: &CancellationToken,
    reporter: &Reporter,
) -> Result<String, LlmError> {
    let wire: GoogleResponse = tokio::select! {
        () = cancel.cancelled() => return Err(LlmError::Cancelled),
        result = response.json::<GoogleResponse>() => result.map_err(|e| {
            wrap_provider_error(
                provider,
                None,
                None,
                format!("failed to parse response: {e}"),
                Some(Box::new(e)),
                &**reporter,
            )
        })?,
    };

    let text = wire
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter(|part| part.thought != Some(true))
                .filter_map(|part| part.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    Ok(text)
}

/// State threaded through the SSE normalization loop
struct SseContext {
    events: futures_util::stream::BoxStream<
        'static,
        Result<eventsource_stream::Event, eventsource_stream::EventStreamError<reqwest::Error>>,
    >,
    state: GoogleStreamState,
    model_info: ModelInfo,
    pending: VecDeque<Result<StreamChunk, LlmError>>,
    done: bool,
}

/// Normalize a streaming response into a chunk stream
///
/// The usage chunk is emitted exactly once, after every other chunk.
pub(crate) fn normalize_stream(response: reqwest::Response, model_info: ModelInfo) -> ChunkStream {
    let ctx = SseContext {
        events: response.bytes_stream().eventsource().boxed(),
        state: GoogleStreamState::new(),
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
                    if data.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<GoogleResponse>(data) {
                        Ok(chunk) => {
                            for normalized in ctx.state.convert_chunk(&chunk) {
                                ctx.pending.push_back(Ok(normalized));
                            }
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "skipping unparseable Google SSE chunk");
                        }
                    }
                }
                Some(Err(e)) => {
                    ctx.pending.push_back(Err(LlmError::Streaming(e.to_string())));
                }
                None => {
                    ctx.done = true;
                    let usage = ctx
                        .state
                        .take_usage()
                        .map(|u| usage_from_metadata(&u, &ctx.model_info))
                        .unwrap_or_default();
                    ctx.pending.push_back(Ok(StreamChunk::Usage(usage)));
                }
            }
        }
    }))
}
