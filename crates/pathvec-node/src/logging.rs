//! Tracing subscriber configuration for protocol node hosts.
//!
//! Log levels follow these conventions:
//! - ERROR: records refused by the codec, never sent
//! - WARN: dropped inbound packets
//! - INFO: node start and stop
//! - DEBUG: store changes, recomputations, evictions
//! - TRACE: individual ticks and transmissions

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingSection, parse_log_format};
use crate::error::NodeError;

/// Install the global subscriber described by a `[logging]` section.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if the
/// format is unknown or a global subscriber is already installed.
pub fn init(section: &LoggingSection) -> Result<(), NodeError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&section.level))
        .map_err(|e| NodeError::Logging(format!("invalid log level '{}': {e}", section.level)))?;

    let result = match parse_log_format(&section.format)? {
        LogFormat::Plain => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
    };
    result.map_err(|e| NodeError::Logging(e.to_string()))
}

/// Initialize the tracing subscriber for tests.
///
/// Uses `try_init` to avoid panicking if called multiple times.
pub fn init_for_tests() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
