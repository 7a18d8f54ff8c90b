//! Tracing subscriber setup for test runs.
//!
//! Page objects only emit `tracing` events; whoever runs the scenarios
//! decides where they go. These helpers cover the common case of a test
//! binary that wants readable output filtered by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset
pub const DEFAULT_DIRECTIVE: &str = "pomkit=info";

fn filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install a human-readable subscriber.
///
/// Returns `false` when a global subscriber was already installed, which is
/// the normal situation when several tests call this.
pub fn init_tracing(default_directive: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default_directive))
        .with_target(true)
        .with_test_writer()
        .try_init()
        .is_ok()
}

/// Install a JSON subscriber, one event per line, for CI log collectors
pub fn init_json_tracing(default_directive: &str) -> bool {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter(default_directive))
        .with_current_span(false)
        .try_init()
        .is_ok()
}
