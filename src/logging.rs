//! Logging - `tracing` subscriber for the CLI and embedding apps.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `RUST_LOG` | Filter directives, default `info` |
//! | `SENTINEL_LOG_JSON=1` | One JSON object per event instead of compact text |
//!
//! Output goes to stderr so stdout stays clean for command JSON. Passwords
//! and decrypted payloads are never passed to a log macro.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Safe to call more than once.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var("SENTINEL_LOG_JSON")
        .map(|value| value == "1")
        .unwrap_or(false);

    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
