//! Telemetry for Prism
//!
//! Provides the error-reporting sink that provider handlers notify before
//! propagating a failure, plus logging setup via the `tracing` ecosystem.

pub mod metrics;

use std::sync::Arc;

/// Classification of a reported provider error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rate limiting / throttling detected upstream
    Throttling,
    /// Any other upstream or transport failure
    Upstream,
}

/// Sink for provider errors
///
/// Every handler reports here before returning an error to the caller;
/// nothing is swallowed on the reporting path.
pub trait ErrorReporter: Send + Sync {
    /// Record one provider error
    fn report(&self, provider: &str, kind: ErrorKind, status: Option<u16>, message: &str);
}

/// Default reporter that emits structured `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, provider: &str, kind: ErrorKind, status: Option<u16>, message: &str) {
        match kind {
            ErrorKind::Throttling => {
                tracing::warn!(provider = %provider, status = ?status, error = %message, "provider throttled");
            }
            ErrorKind::Upstream => {
                tracing::error!(provider = %provider, status = ?status, error = %message, "provider error");
            }
        }
    }
}

/// Reporter that records nothing
///
/// Useful in tests that assert on returned errors rather than side effects.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ErrorReporter for NoopReporter {
    fn report(&self, _provider: &str, _kind: ErrorKind, _status: Option<u16>, _message: &str) {}
}

/// Shared handle to an error reporter
pub type Reporter = Arc<dyn ErrorReporter>;

/// Build the default tracing-backed reporter handle
pub fn default_reporter() -> Reporter {
    Arc::new(TracingReporter)
}

/// Initialize logging from an env-filter directive string
///
/// Falls back to `info` when the directive fails to parse. Safe to call
/// once per process; later calls are ignored.
pub fn init_logging(log_filter: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_new(log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}
