//! Tracing initialisation shared by the Guardian binaries.
//!
//! Filter resolution order: `GUARDIAN_LOG`, then `RUST_LOG`, then the
//! level passed by the caller. Only the first call installs a subscriber;
//! later calls are ignored.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding a service-specific filter directive.
pub const LOG_ENV: &str = "GUARDIAN_LOG";

fn resolve_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber.
///
/// `json` selects newline-delimited JSON output for log shippers; otherwise
/// a compact human-readable format is used.
pub fn init_tracing(json: bool, level: Level) {
    let filter = resolve_filter(level);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry
            .with(fmt::layer().with_target(true).json())
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
