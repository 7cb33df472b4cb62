//! Subscriber setup for the `trellis` binary and embedding applications

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives
pub const LOG_ENV: &str = "TRELLIS_LOG";

/// Install a global `fmt` subscriber
///
/// Directives come from `TRELLIS_LOG`, falling back to `default_directives`.
/// Returns `false` if a subscriber was already installed.
pub fn init(default_directives: &str, json: bool) -> bool {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directives));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.is_ok()
}
