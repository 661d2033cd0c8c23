//! Tracing/logging initialization.
//!
//! Sets up `tracing_subscriber` with an env-filter and optional JSON output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the global tracing subscriber.
///
/// * `default_filter` -- filter used when `RUST_LOG` is not set
///   (e.g. `"drctl_server=info"`).
/// * `log_json` -- when `true`, emit structured JSON log lines instead of the
///   human-readable format.
pub fn init_tracing(default_filter: &str, log_json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
    );
    let registry = tracing_subscriber::registry().with(env_filter);
    if log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Build the default filter directive for a crate at the given level,
/// e.g. `default_filter("drctl_server", "debug")` -> `"drctl_server=debug"`.
pub fn default_filter(target: &str, level: &str) -> String {
    format!("{target}={level}")
}
