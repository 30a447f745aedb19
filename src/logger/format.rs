//! Access log format module
//!
//! Supports three log formats:
//! - `combined` (Apache/Nginx combined format, the default)
//! - `common` (Common Log Format - CLF)
//! - `json` (one JSON object per line)

use chrono::Local;
use hyper::http::request::Parts;
use hyper::http::Version;
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;

/// Access log entry describing one handled request
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client address, `-` when unknown
    pub remote_addr: String,
    pub time: chrono::DateTime<Local>,
    pub method: String,
    /// Request URI path and query
    pub uri: String,
    /// HTTP version (1.0, 1.1, 2)
    pub http_version: &'static str,
    pub status: u16,
    /// Response body size in bytes
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub latency: Duration,
}

impl AccessLogEntry {
    /// Build an entry from the request head, stamped with the current time
    pub fn from_request(parts: &Parts, remote_addr: Option<SocketAddr>) -> Self {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        Self {
            remote_addr: remote_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
            time: Local::now(),
            method: parts.method.to_string(),
            uri: parts
                .uri
                .path_and_query()
                .map_or_else(|| parts.uri.path().to_string(), ToString::to_string),
            http_version: version_label(parts.version),
            status: 200,
            body_bytes: 0,
            referer: header("referer"),
            user_agent: header("user-agent"),
            latency: Duration::ZERO,
        }
    }

    /// Format the log entry according to the specified format
    ///
    /// Unknown format names fall back to `combined`.
    pub fn format(&self, format: &str) -> String {
        match format {
            "common" => self.format_common(),
            "json" => self.format_json(),
            _ => self.format_combined(),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} HTTP/{}", self.method, self.uri, self.http_version)
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    /// Common format followed by `"$http_referer" "$http_user_agent" $request_time`
    fn format_combined(&self) -> String {
        format!(
            "{} \"{}\" \"{}\" {:.3}",
            self.format_common(),
            self.referer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
            self.latency.as_secs_f64(),
        )
    }

    fn format_json(&self) -> String {
        json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "uri": self.uri,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_us": u64::try_from(self.latency.as_micros()).unwrap_or(u64::MAX),
        })
        .to_string()
    }
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
