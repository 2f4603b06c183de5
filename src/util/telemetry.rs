//! Telemetry helpers for structured logging.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset: lifecycle transitions at info.
pub const DEFAULT_FILTER: &str = "scout_dispatch=info";

/// Install a fmt subscriber filtered by `RUST_LOG`, or by [`DEFAULT_FILTER`]
/// when the variable is unset. Does nothing if a global subscriber exists.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
