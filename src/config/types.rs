// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Startup argument that selects the CORS-restricted listener
pub const CORS_LISTENER_ARG: &str = "7070";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(rename = "static")]
    pub static_files: StaticConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    /// Port of the primary listener
    pub port: u16,
    /// Port of the CORS-restricted listener
    pub cors_port: u16,
    pub workers: Option<usize>,
}

/// Static file locations served by the primary listener
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StaticConfig {
    /// Directory mounted at `/es`
    pub es_dir: String,
    /// File served at `/`
    pub index_file: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common or json)
    pub access_log_format: String,
    /// Dump url, headers and body of every primary-listener request
    pub request_dump: bool,
}

/// Connection handling configuration
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Seconds before a connection is dropped, 0 disables the limit
    pub connection_timeout: u64,
}

/// Which of the two listeners this process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    /// Full route surface, request dump and static files
    Primary,
    /// GET/POST echo routes behind the CORS policy
    Cors,
}

impl ListenerKind {
    /// Pick the listener from the positional arguments (program name excluded)
    pub fn from_args<I, S>(mut args: I) -> Self
    where
        I: Iterator<Item = S>,
        S: AsRef<str>,
    {
        match args.next() {
            Some(arg) if arg.as_ref() == CORS_LISTENER_ARG => Self::Cors,
            _ => Self::Primary,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Cors => "cors",
        }
    }
}
