//! Tracing subscriber setup
//!
//! Hosts embedding the pipeline usually install their own subscriber; this
//! helper covers binaries and examples that just want env-filtered stdout
//! logging.

use tracing_subscriber::prelude::*;

/// Initialises an env-filtered stdout subscriber
///
/// Respects `RUST_LOG`, defaulting to `info`. Safe to call more than once;
/// subsequent calls are no-ops.
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
