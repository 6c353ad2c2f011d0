//! Tracing subscriber setup.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::GlobalArgs;

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "WARMSTART_LOG";

/// Installs a stderr `fmt` layer filtered by `WARMSTART_LOG`, then `RUST_LOG`,
/// then the verbosity flags.
pub fn init(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive(global)));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(global.verbose);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn default_directive(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    }
}
