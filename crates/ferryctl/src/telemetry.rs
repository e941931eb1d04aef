//! Logging initialization for `ferryctl`.
//!
//! Plain `tracing-subscriber` with the `fmt` layer, filtered by `RUST_LOG`
//! or, when that is unset, by the configured level. Logs go to stderr so
//! routing output on stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber.
///
/// Call this once at startup, before any `tracing` events are emitted.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
