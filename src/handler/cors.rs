//! CORS policy for the alternate listener
//!
//! Requests without an `Origin`, or whose origin is the server itself, pass
//! through untouched. Listed origins get the CORS headers; others get 403.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, HOST, ORIGIN, VARY,
};
use hyper::http::request::Parts;
use hyper::{Method, Response, StatusCode};

use crate::http;

/// Origins of the local development pages that exercise the fixture
const LOCAL_ORIGINS: [&str; 2] = ["http://localhost:8080", "http://localhost:3000"];

/// Outcome of checking a request against the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsDecision {
    /// Not a cross-origin request
    Bypass,
    /// Cross-origin request from an origin outside the allow list
    Rejected,
    Preflight(HeaderValue),
    Allowed(HeaderValue),
}

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_origins: Vec<HeaderValue>,
    allow_methods: HeaderValue,
    expose_headers: HeaderValue,
    allow_credentials: bool,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::local_development()
    }
}

impl CorsPolicy {
    /// Local development origins, GET/POST, `X-Cors` and `Set-Cookie` exposed, credentials allowed
    pub fn local_development() -> Self {
        Self {
            allow_origins: LOCAL_ORIGINS
                .into_iter()
                .map(HeaderValue::from_static)
                .collect(),
            allow_methods: HeaderValue::from_static("GET,POST"),
            expose_headers: HeaderValue::from_static("X-Cors,Set-Cookie"),
            allow_credentials: true,
        }
    }

    pub fn evaluate(&self, parts: &Parts) -> CorsDecision {
        let Some(origin) = parts.headers.get(ORIGIN).filter(|o| !o.is_empty()) else {
            return CorsDecision::Bypass;
        };

        if is_same_origin(origin, parts) {
            return CorsDecision::Bypass;
        }

        if !self.allow_origins.iter().any(|allowed| allowed == origin) {
            return CorsDecision::Rejected;
        }

        if parts.method == Method::OPTIONS {
            CorsDecision::Preflight(origin.clone())
        } else {
            CorsDecision::Allowed(origin.clone())
        }
    }

    /// 204 answer to an `OPTIONS` preflight from an allowed origin
    pub fn preflight_response(&self, origin: HeaderValue) -> Response<Full<Bytes>> {
        let mut response = http::build_empty_response(StatusCode::NO_CONTENT);
        let headers = response.headers_mut();

        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        if self.allow_credentials {
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        for varied in [
            "Origin",
            "Access-Control-Request-Method",
            "Access-Control-Request-Headers",
        ] {
            headers.append(VARY, HeaderValue::from_static(varied));
        }

        response
    }

    /// Decorate a route response for an allowed origin
    pub fn apply(&self, response: &mut Response<Full<Bytes>>, origin: HeaderValue) {
        let headers = response.headers_mut();

        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        if self.allow_credentials {
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, self.expose_headers.clone());
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
}

/// Origin names the host the request was sent to
fn is_same_origin(origin: &HeaderValue, parts: &Parts) -> bool {
    let host = parts
        .headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| parts.uri.authority().map(hyper::http::uri::Authority::as_str));

    match (origin.to_str(), host) {
        (Ok(origin), Some(host)) => {
            origin.strip_prefix("http://") == Some(host)
                || origin.strip_prefix("https://") == Some(host)
        }
        _ => false,
    }
}
