//! Tracing subscriber setup: pretty or JSON-lines output on stderr, level
//! driven by `--log-level` (overridable via `RUST_LOG`).

use tracing_subscriber::EnvFilter;

/// Install a global subscriber writing to stderr so stdout stays reserved for
/// the single JSON response line.
pub fn init_tracing(json: bool, log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
