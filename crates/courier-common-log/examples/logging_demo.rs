//! Shows what a request span looks like under each log format.
//!
//! `COURIER_LOG_FORMAT=json cargo run -p courier-common-log --example logging_demo`

use courier_common_log::{debug, init, spans, warn, LogConfig, LogLevel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = LogConfig::from_env();
    config.level = LogLevel::Debug;
    config.span_events = true;
    init(config)?;

    let span = spans::request_span("GET", "http://localhost:3000/user");
    let _guard = span.enter();

    debug!(attempt = 1, "sending request");
    warn!(attempt = 1, delay_ms = 2000, "attempt failed, retrying");
    debug!(attempt = 2, status = 200, "response received");
    spans::record_outcome(&span, Some(200), 2);

    Ok(())
}
