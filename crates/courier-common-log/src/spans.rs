//! Tracing spans for outbound HTTP calls.

use std::future::Future;
use tracing::{field, info_span, Instrument, Span};

/// Span covering one logical request, across all of its attempts.
///
/// `status` and `attempts` start empty and are filled in with
/// [`record_outcome`] once the call settles.
pub fn request_span(method: &str, url: &str) -> Span {
    info_span!(
        "http.request",
        method = %method,
        url = %url,
        status = field::Empty,
        attempts = field::Empty,
        error = field::Empty,
    )
}

/// Record the final status code and attempt count on `span`.
pub fn record_outcome(span: &Span, status: Option<u16>, attempts: u32) {
    if let Some(status) = status {
        span.record("status", status);
    }
    span.record("attempts", attempts);
}

/// Instrument a future with a span.
pub fn instrument_future<F: Future>(future: F, span: Span) -> impl Future<Output = F::Output> {
    future.instrument(span)
}

/// Record an error on the current span.
pub fn record_error(error: &dyn std::error::Error) {
    Span::current().record("error", field::display(error));
}

/// Timing utility for operations.
pub struct Timer {
    start: std::time::Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: std::time::Instant::now(),
            operation,
        }
    }

    /// Complete the timer and record duration.
    pub fn finish(self) -> std::time::Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.operation,
            duration_ms = %duration.as_millis(),
            "operation completed"
        );
        duration
    }
}
