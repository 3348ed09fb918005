//! Tracing setup.
//!
//! Logs go to stderr so generated text on stdout stays clean. The filter is
//! taken from `SCHEMAGEN_LOG`, then `RUST_LOG`, then the configured level.

use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_ENV: &str = "SCHEMAGEN_LOG";

pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_tracing(log_level: &str) {
    let _ = fmt()
        .with_env_filter(env_filter(log_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
