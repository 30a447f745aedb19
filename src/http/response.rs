//! HTTP response building module
//!
//! Builders for the handful of response shapes the fixture emits. Builder
//! failures never panic: they are logged and replaced with an empty response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};

pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";
pub const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Build a plain text response
pub fn build_text_response(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, TEXT_PLAIN_UTF8)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("text", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a JSON response
///
/// `content_type` replaces the default `application/json; charset=utf-8`.
pub fn build_json_response(
    status: StatusCode,
    value: &serde_json::Value,
    content_type: Option<&str>,
) -> Response<Full<Bytes>> {
    let body = match serde_json::to_vec(value) {
        Ok(body) => body,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to encode JSON body: {e}"));
            return build_empty_response(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type.unwrap_or(JSON_UTF8))
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("JSON", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a response with no body and no content type
pub fn build_empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from_static(b"404 page not found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from_static(b"404 page not found")))
        })
}

/// Build a static file response, body omitted for HEAD
pub fn build_file_response(
    data: Vec<u8>,
    content_type: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(data)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("file", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Log response build error
fn log_build_error(kind: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {kind} response: {error}"));
}
