//! Logger module
//!
//! Provides logging utilities for the fixture server including:
//! - Subscriber initialization from the logging configuration
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - The per-request observer hook

mod format;
mod observer;

pub use format::AccessLogEntry;
pub use observer::{LoggingObserver, NoopObserver, RequestObserver, RequestSummary};

use crate::config::{Config, ListenerKind, LoggingConfig};
use crate::error::ServerError;
use std::net::SocketAddr;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Target used for access log lines, filterable with `RUST_LOG=access=off`
const ACCESS_TARGET: &str = "access";

/// Initialize the global subscriber
///
/// Should be called once at application startup. `RUST_LOG` takes precedence
/// over the configured level.
pub fn init(config: &LoggingConfig) -> Result<(), ServerError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(ServerError::Logger)
}

pub fn log_server_start(addr: &SocketAddr, kind: ListenerKind, config: &Config) {
    info!("======================================");
    info!(listener = kind.label(), "Echo fixture server started");
    info!("Listening on: http://{addr}");
    match kind {
        ListenerKind::Primary => {
            info!("Static files: /es -> {}", config.static_files.es_dir);
            info!("Index file: / -> {}", config.static_files.index_file);
        }
        ListenerKind::Cors => info!("CORS policy enabled for GET/POST echo routes"),
    }
    if let Some(workers) = config.server.workers {
        info!("Worker threads: {workers}");
    }
    info!("======================================");
}

pub fn log_info(message: &str) {
    info!("{message}");
}

pub fn log_warning(message: &str) {
    warn!("{message}");
}

pub fn log_error(message: &str) {
    error!("{message}");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    debug!("Accepting connection from {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    error!("Failed to serve connection: {err:?}");
}

pub fn log_shutdown(addr: &SocketAddr) {
    info!("Shutdown requested, no longer accepting on {addr}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    info!(target: ACCESS_TARGET, "{}", entry.format(format));
}
