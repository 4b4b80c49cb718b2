mod harness;

use std::sync::Arc;

use harness::mock_upstream::{Behavior, MockUpstream};
use prism_config::ProviderConfig;
use prism_llm::provider::groq::GroqProvider;
use prism_llm::{CallMetadata, LlmError, Message, PromptOptions, Provider, Role};
use prism_telemetry::NoopReporter;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use url::Url;

fn provider_config(base_url: &str) -> ProviderConfig {
    ProviderConfig {
        api_key: Some(SecretString::from("test-key")),
        base_url: Some(Url::parse(base_url).unwrap()),
        ..ProviderConfig::default()
    }
}

#[tokio::test]
async fn status_429_rethrows_the_original_message() {
    let mock = MockUpstream::start(Behavior::Error {
        status: 429,
        body: r#"{"error":{"message":"Rate limit reached for model","type":"tokens"}}"#.to_owned(),
    })
    .await
    .unwrap();

    let provider = GroqProvider::new(&provider_config(&mock.base_url()), Arc::new(NoopReporter));
    let messages = [Message::text(Role::User, "Hello")];
    let err = provider
        .create_message("", &messages, &CallMetadata::default())
        .await
        .err()
        .unwrap();

    assert!(matches!(err, LlmError::Throttled { .. }));
    assert_eq!(err.to_string(), "Rate limit reached for model");
    assert_eq!(err.status(), Some(429));
}

#[tokio::test]
async fn other_errors_are_wrapped_with_the_provider_name() {
    let mock = MockUpstream::start(Behavior::Error {
        status: 500,
        body: r#"{"error":{"message":"boom","type":"server_error"}}"#.to_owned(),
    })
    .await
    .unwrap();

    let provider = GroqProvider::new(&provider_config(&mock.base_url()), Arc::new(NoopReporter));
    let messages = [Message::text(Role::User, "Hello")];
    let err = provider
        .create_message("", &messages, &CallMetadata::default())
        .await
        .err()
        .unwrap();

    assert!(matches!(err, LlmError::Provider { .. }));
    assert_eq!(err.to_string(), "Groq: boom");
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn non_json_error_body_is_coerced_to_a_message() {
    let mock = MockUpstream::start(Behavior::Error {
        status: 503,
        body: "upstream unavailable".to_owned(),
    })
    .await
    .unwrap();

    let provider = GroqProvider::new(&provider_config(&mock.base_url()), Arc::new(NoopReporter));
    let messages = [Message::text(Role::User, "Hello")];
    let err = provider
        .create_message("", &messages, &CallMetadata::default())
        .await
        .err()
        .unwrap();

    assert_eq!(err.to_string(), "Groq: upstream unavailable");
}

#[tokio::test]
async fn cancelled_token_short_circuits_before_the_request() {
    // No server needed: the token is checked before anything is sent
    let provider = GroqProvider::new(&provider_config("http://127.0.0.1:9/v1"), Arc::new(NoopReporter));

    let cancel = CancellationToken::new();
    cancel.cancel();

    let messages = [Message::text(Role::User, "Hello")];
    let metadata = CallMetadata {
        cancel: cancel.clone(),
        ..CallMetadata::default()
    };
    let err = provider.create_message("", &messages, &metadata).await.err().unwrap();
    assert!(matches!(err, LlmError::Cancelled));

    let options = PromptOptions {
        cancel,
        ..PromptOptions::default()
    };
    let err = provider.complete_prompt("ping", &options).await.unwrap_err();
    assert!(matches!(err, LlmError::Cancelled));
}

#[tokio::test]
async fn complete_prompt_returns_the_answer_text() {
    let mock = MockUpstream::start(Behavior::Json(serde_json::json!({
        "id": "resp-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "pong"},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 3, "completion_tokens": 1}
    })))
    .await
    .unwrap();

    let provider = GroqProvider::new(&provider_config(&mock.base_url()), Arc::new(NoopReporter));
    let answer = provider
        .complete_prompt("ping", &PromptOptions::default())
        .await
        .unwrap();
    assert_eq!(answer, "pong");
}
