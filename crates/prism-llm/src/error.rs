use prism_telemetry::{ErrorKind, ErrorReporter};
use thiserror::Error;

/// Errors that can occur during provider operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// Rate limiting upstream; the original message is preserved verbatim
    /// so callers' retry logic sees the error in its original shape
    #[error("{message}")]
    Throttled {
        /// Original vendor error message, unmodified
        message: String,
        /// HTTP status when discoverable
        status: Option<u16>,
    },

    /// Any other upstream failure, wrapped with the provider name
    #[error("{provider}: {message}")]
    Provider {
        /// Provider display name
        provider: &'static str,
        /// Coerced vendor error message
        message: String,
        /// HTTP status when discoverable
        status: Option<u16>,
        /// Original error, when one exists
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error while consuming a streaming response
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Caller supplied a request the adapter cannot express
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The call was cancelled via its cancellation token
    #[error("request cancelled")]
    Cancelled,

    /// Provider construction failed
    #[error("configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// HTTP status attached to the error, when discoverable
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Throttled { status, .. } | Self::Provider { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether this error indicates upstream throttling
    pub const fn is_throttling(&self) -> bool {
        matches!(self, Self::Throttled { .. })
    }
}

/// Message substrings that indicate throttling regardless of status code
const THROTTLING_MARKERS: &[&str] = &[
    "throttl",
    "rate limit",
    "too many requests",
    "bedrock is unable to process your request",
];

/// Throttling predicate
///
/// Matches HTTP 429, the named `ThrottlingException`, or any of the known
/// message substrings (case-insensitive).
pub fn is_throttling_error(status: Option<u16>, error_name: Option<&str>, message: &str) -> bool {
    if status == Some(429) {
        return true;
    }
    if error_name == Some("ThrottlingException") {
        return true;
    }
    let lowered = message.to_lowercase();
    THROTTLING_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Classify and report one provider failure
///
/// Throttling errors are passed through with the original message intact;
/// everything else is wrapped as `"<Provider>: <message>"` with the status
/// preserved and the original attached as source. The error is reported to
/// the telemetry sink before being returned — nothing is swallowed.
pub fn wrap_provider_error(
    provider: &'static str,
    status: Option<u16>,
    error_name: Option<&str>,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    reporter: &dyn ErrorReporter,
) -> LlmError {
    if is_throttling_error(status, error_name, &message) {
        reporter.report(provider, ErrorKind::Throttling, status, &message);
        return LlmError::Throttled { message, status };
    }

    reporter.report(provider, ErrorKind::Upstream, status, &message);
    LlmError::Provider {
        provider,
        message,
        status,
        source,
    }
}

/// Map a transport error into the provider taxonomy
///
/// `reqwest` failures carry a status only when the server responded.
pub fn from_transport(provider: &'static str, err: reqwest::Error, reporter: &dyn ErrorReporter) -> LlmError {
    let status = err.status().map(|s| s.as_u16());
    wrap_provider_error(provider, status, None, err.to_string(), Some(Box::new(err)), reporter)
}

#[cfg(test)]
mod tests {
    use prism_telemetry::NoopReporter;

    use super::*;

    #[test]
    fn status_429_is_throttling() {
        assert!(is_throttling_error(Some(429), None, "anything at all"));
    }

    #[test]
    fn named_exception_is_throttling() {
        assert!(is_throttling_error(None, Some("ThrottlingException"), "opaque"));
    }

    #[test]
    fn message_markers_are_throttling() {
        for message in [
            "Request was throttled",
            "You hit a rate limit",
            "Too Many Requests",
            "Bedrock is unable to process your request",
        ] {
            assert!(is_throttling_error(None, None, message), "{message}");
        }
    }

    #[test]
    fn plain_errors_are_not_throttling() {
        assert!(!is_throttling_error(Some(500), None, "internal server error"));
        assert!(!is_throttling_error(None, Some("ValidationException"), "bad input"));
    }

    #[test]
    fn throttled_message_survives_rethrow_unmodified() {
        let original = "Bedrock is unable to process your request";
        let err = wrap_provider_error("Bedrock", None, None, original.to_owned(), None, &NoopReporter);
        assert_eq!(err.to_string(), original);
        assert!(err.is_throttling());
    }

    #[test]
    fn other_errors_are_wrapped_with_provider_name() {
        let err = wrap_provider_error(
            "Groq",
            Some(500),
            None,
            "upstream exploded".to_owned(),
            None,
            &NoopReporter,
        );
        assert_eq!(err.to_string(), "Groq: upstream exploded");
        assert_eq!(err.status(), Some(500));
    }
}
