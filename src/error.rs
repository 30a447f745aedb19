//! Startup and serve errors

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("invalid listen address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to initialize logger: {0}")]
    Logger(#[source] Box<dyn std::error::Error + Send + Sync>),
}
