//! Tracing subscriber setup shared by all binaries

use crate::config::LoggingConfig;
use crate::{Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Filter directive derived from the configured level
///
/// Unknown levels fall back to `info`.
pub fn filter_directive(config: &LoggingConfig) -> String {
    let level = config.level.trim().to_ascii_lowercase();
    if VALID_LEVELS.contains(&level.as_str()) {
        level
    } else {
        "info".to_string()
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes priority over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to initialize tracing: {}", e)))
}
