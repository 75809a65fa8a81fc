//! Logging setup for the `ledger` binary
//!
//! Output goes to stderr; stdout carries the response CSV. `RUST_LOG`, when
//! set, takes precedence over the level given on the command line.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber
///
/// # Arguments
///
/// * `level` - Default filter directive, e.g. `info` or `account_ledger=debug`
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}
