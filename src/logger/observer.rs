//! Request observer hook
//!
//! The primary listener hands every request to a [`RequestObserver`] once its
//! body has been read. Observers only look; they cannot change the response.

use hyper::body::Bytes;
use hyper::{HeaderMap, Uri};

/// Borrowed view of one incoming request
#[derive(Debug, Clone, Copy)]
pub struct RequestSummary<'a> {
    pub url: &'a Uri,
    pub headers: &'a HeaderMap,
    pub body: &'a Bytes,
}

impl RequestSummary<'_> {
    /// Header pairs in request order, one entry per value
    pub fn header_pairs(&self) -> impl Iterator<Item = (&str, String)> {
        self.headers.iter().map(|(name, value)| {
            (
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
    }

    pub fn headers_line(&self) -> String {
        self.header_pairs()
            .map(|(name, value)| format!("{name}:{value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub trait RequestObserver: Send + Sync {
    fn observe(&self, summary: &RequestSummary<'_>);
}

/// Dumps url, headers and body through the logger
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl RequestObserver for LoggingObserver {
    fn observe(&self, summary: &RequestSummary<'_>) {
        super::log_info(&format!("[request.url] {}", summary.url));
        super::log_info(&format!("[request.headers] {}", summary.headers_line()));
        super::log_info(&format!(
            "[request.body] {}",
            String::from_utf8_lossy(summary.body)
        ));
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {
    fn observe(&self, _summary: &RequestSummary<'_>) {}
}
