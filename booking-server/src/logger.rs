//! Logging Infrastructure
//!
//! `RUST_LOG` wins over the default filter; `LOG_FORMAT=json` switches to
//! one JSON object per line for log shipping.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "booking_server=info,shared=info,tower_http=info";

/// Initialize the global subscriber
pub fn init_logger(format: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false);

    if format.eq_ignore_ascii_case("json") {
        subscriber.json().with_current_span(false).init();
    } else {
        subscriber.with_target(false).init();
    }
}
