//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "CI_GATE_LOG";

static INIT: Once = Once::new();

/// Initialize the ci-gate tracing/logging system.
///
/// Reads `CI_GATE_LOG` for per-target log levels, e.g.
/// `CI_GATE_LOG=ci_gate::checks=debug`. Falls back to `ci_gate=warn`, or
/// `ci_gate=debug` when `verbose` is set.
///
/// Logs go to stderr; stdout carries only the verdict. Calling this more
/// than once has no effect.
pub fn init_tracing(verbose: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .try_init()
            .ok();
    });
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "ci_gate=debug"
    } else {
        "ci_gate=warn"
    }
}
