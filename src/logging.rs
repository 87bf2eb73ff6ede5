//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt};

/// Initialize human-readable logging on stderr.
///
/// Uses the `RUST_LOG` environment variable if set, otherwise falls back
/// to `default_level` (e.g. "info", "autocommit=debug,warn").
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

/// Default filter for the given verbosity flag.
pub fn default_level(verbose: bool) -> &'static str {
    if verbose { "autocommit=debug,info" } else { "info" }
}
