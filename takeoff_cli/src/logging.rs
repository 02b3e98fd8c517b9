//! Logging setup (tracing-subscriber)

use tracing_subscriber::{fmt, EnvFilter};

/// Default filter for a verbosity count: 0 warn, 1 debug, 2+ trace.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialise the global subscriber. `RUST_LOG` overrides `-v`.
///
/// Logs go to stderr so table and JSON output stay clean on stdout.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity > 0)
        .with_line_number(verbosity > 1)
        .try_init();
}
