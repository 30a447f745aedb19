// Configuration module entry point
// Loads the fixture configuration and resolves listener addresses

mod types;

use ::config::builder::DefaultState;
use ::config::{ConfigBuilder, ConfigError};
use std::net::SocketAddr;

use crate::error::ServerError;

// Re-export public types
pub use types::{Config, ListenerKind, LoggingConfig, PerformanceConfig, StaticConfig};

/// Config file looked up in the working directory (any format the `config` crate knows)
const CONFIG_FILE: &str = "fixture";

impl Config {
    /// Load configuration from `fixture.toml` when present, defaults otherwise
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        Self::from_builder(
            ::config::Config::builder()
                .add_source(::config::File::with_name(config_path).required(false)),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.cors_port", 7070)?
            .set_default("static.es_dir", "../es")?
            .set_default("static.index_file", "./index.html")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("logging.request_dump", true)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 75)?
            .build()?
            .try_deserialize()
    }

    /// Address the given listener binds to
    pub fn socket_addr(&self, kind: ListenerKind) -> Result<SocketAddr, ServerError> {
        let port = match kind {
            ListenerKind::Primary => self.server.port,
            ListenerKind::Cors => self.server.cors_port,
        };
        let addr = format!("{}:{}", self.server.host, port);
        addr.parse()
            .map_err(|source| ServerError::InvalidAddress { addr, source })
    }
}
