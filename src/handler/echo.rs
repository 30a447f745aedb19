//! Echo route execution
//!
//! Turns a matched [`EchoKind`] plus the buffered request into a response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_LENGTH, SET_COOKIE};
use hyper::http::request::Parts;
use hyper::{HeaderMap, Response, StatusCode};
use serde_json::json;

use crate::http::{self, cookie};
use crate::logger;
use crate::routing::{EchoKind, FixtureCookie, RouteSpec};

pub fn respond(route: &RouteSpec, parts: &Parts, body: Bytes) -> Response<Full<Bytes>> {
    match route.kind {
        EchoKind::Text(text) => {
            http::build_text_response(StatusCode::OK, Bytes::from_static(text.as_bytes()))
        }
        EchoKind::Json {
            explicit_content_type,
        } => http::build_json_response(
            StatusCode::OK,
            &json!({ "key": "value" }),
            explicit_content_type.then_some("application/json"),
        ),
        EchoKind::ReturnHeaders => return_headers(&parts.headers),
        EchoKind::ReturnBody { content_length } => return_body(body, content_length),
        EchoKind::SetCookie {
            cookie,
            extra_header,
        } => set_cookie(cookie, extra_header),
        EchoKind::CheckCookie(expected) => check_cookie(&parts.headers, expected, &route.path),
        EchoKind::Empty => http::build_empty_response(StatusCode::OK),
    }
}

fn return_headers(request_headers: &HeaderMap) -> Response<Full<Bytes>> {
    let mut response = http::build_empty_response(StatusCode::OK);
    let headers = response.headers_mut();

    for (name, value) in request_headers {
        // A copied length would mis-frame the empty response body
        if *name == CONTENT_LENGTH {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    response
}

fn return_body(body: Bytes, content_length: bool) -> Response<Full<Bytes>> {
    let length = body.len();
    let mut response = http::build_text_response(StatusCode::OK, body);
    if content_length {
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(length));
    }
    response
}

fn set_cookie(
    cookie: FixtureCookie,
    extra_header: Option<(&'static str, &'static str)>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(SET_COOKIE, cookie.header_value());
    if let Some((name, value)) = extra_header {
        builder = builder.header(name, value);
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        logger::log_error(&format!("Failed to build set-cookie response: {e}"));
        http::build_empty_response(StatusCode::OK)
    })
}

fn check_cookie(headers: &HeaderMap, expected: FixtureCookie, path: &str) -> Response<Full<Bytes>> {
    match cookie::find_cookie(headers, expected.name) {
        Some(value) if value == expected.value => http::build_empty_response(StatusCode::OK),
        found => {
            logger::log_warning(&format!(
                "{path}: cookie '{}' expected '{}', got {found:?}",
                expected.name, expected.value
            ));
            http::build_empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
