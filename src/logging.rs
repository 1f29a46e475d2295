//! Tracing subscriber setup for the binary and the Python module.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `smiles_lookup=debug`.
pub const LOG_ENV: &str = "SMILES_LOOKUP_LOG";

/// Install a stderr subscriber filtered by [`LOG_ENV`] (default `info`).
/// Does nothing if a global subscriber is already set.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    // Err only means a subscriber is already installed.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
