//! Mock upstream server for integration tests
//!
//! Implements a minimal OpenAI-compatible chat completions endpoint that
//! serves one canned behavior per server instance.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Router, routing};
use tokio_util::sync::CancellationToken;

/// What the mock returns for every chat completions request
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Stream the given SSE data lines (JSON strings or `[DONE]`)
    Sse(Vec<String>),
    /// Respond with a JSON body
    Json(serde_json::Value),
    /// Respond with an error status and raw body
    Error {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
}

/// Mock upstream that serves one canned behavior
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
}

impl MockUpstream {
    /// Start the mock server, returning immediately
    pub async fn start(behavior: Behavior) -> anyhow::Result<Self> {
        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .with_state(Arc::new(behavior));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown })
    }

    /// Base URL for configuring the mock as a provider
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_chat_completions(State(behavior): State<Arc<Behavior>>) -> Response {
    match behavior.as_ref() {
        Behavior::Sse(lines) => {
            let body: String = lines.iter().map(|line| format!("data: {line}\n\n")).collect();
            ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
        }
        Behavior::Json(value) => axum::Json(value.clone()).into_response(),
        Behavior::Error { status, body } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body.clone(),
        )
            .into_response(),
    }
}
