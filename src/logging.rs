//! Tracing setup for the `govwatch` binary.
//!
//! Events go to stderr so that stdout carries only command output (an
//! export piped to a file stays valid JSON). The level comes from
//! `RUST_LOG`, defaulting to `info`, or `debug` with `--verbose`.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (tests, embedding) is harmless, so the error is dropped.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
