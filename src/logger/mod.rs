//! Logger module
//!
//! Provides logging utilities for the server:
//! - `tracing` subscriber setup
//! - Server lifecycle logging
//! - Access logging with multiple formats, under the `access` target

mod format;

pub use format::AccessLogEntry;

use crate::config::{Config, LoggingConfig};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// Logger initialization failures
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("invalid log level '{level}': {source}")]
    Level {
        level: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("failed to install subscriber: {0}")]
    Init(String),
}

/// Build the filter: `RUST_LOG` when set, `logging.level` otherwise
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggerError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|source| LoggerError::Level {
        level: config.level.clone(),
        source,
    })
}

/// Install the global subscriber
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> Result<(), LoggerError> {
    let filter = build_env_filter(config)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| LoggerError::Init(e.to_string()))
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("listening on http://{addr}");
    tracing::info!(level = %config.logging.level, "log level");
    if let Some(workers) = config.server.workers {
        tracing::info!(workers, "worker threads");
    }
    if let Some(max) = config.performance.max_connections {
        tracing::info!(max, "connection limit");
    }
    tracing::info!(
        groups = config.groups.len(),
        combo = config.combo.enabled,
        "routes configured"
    );
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: "access", "{}", entry.format(format));
}
