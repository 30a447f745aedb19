//! Declarative route table
//!
//! Every route is a row of (method, path, kind). The rows are built once at
//! startup and never change; `handler::echo` turns a kind into a response.

use hyper::Method;

use super::matcher::match_route;

const API_PREFIX: &str = "/api";

pub const HELLO_TEXT: &str = "hello world";
pub const PROBE_TEXT: &str = "ok";

/// A cookie the fixture hands out and later expects back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureCookie {
    pub name: &'static str,
    pub value: &'static str,
}

impl FixtureCookie {
    pub fn header_value(self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

pub const GET_COOKIE: FixtureCookie = FixtureCookie {
    name: "foo-get",
    value: "bar",
};

pub const POST_COOKIE: FixtureCookie = FixtureCookie {
    name: "foo-post",
    value: "bar",
};

/// Header sent next to the GET cookie so clients can check exposed headers
pub const CORS_PROBE_HEADER: (&str, &str) = ("X-Cors", "amazing");

/// What a route does with the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoKind {
    /// Fixed plain text body
    Text(&'static str),
    /// Fixed `{"key":"value"}` body
    Json {
        /// Send exactly `application/json` instead of the charset-qualified default
        explicit_content_type: bool,
    },
    /// Request headers copied onto the response
    ReturnHeaders,
    /// Request body written back verbatim
    ReturnBody { content_length: bool },
    SetCookie {
        cookie: FixtureCookie,
        extra_header: Option<(&'static str, &'static str)>,
    },
    /// 500 unless the cookie came back with the expected value
    CheckCookie(FixtureCookie),
    /// 200 with headers only
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub method: Method,
    pub path: String,
    pub kind: EchoKind,
}

impl RouteSpec {
    fn api(method: Method, name: &str, kind: EchoKind) -> Self {
        Self {
            method,
            path: format!("{API_PREFIX}/{name}"),
            kind,
        }
    }
}

/// Immutable set of routes served by one listener
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteSpec>,
}

impl RouteTable {
    pub const fn new(routes: Vec<RouteSpec>) -> Self {
        Self { routes }
    }

    /// Full route surface of the primary listener
    pub fn primary() -> Self {
        let mut routes = Vec::new();

        routes.extend(echo_group(&Method::GET, "get"));
        routes.extend(cookie_group(&Method::GET, "get", GET_COOKIE, Some(CORS_PROBE_HEADER)));
        routes.extend(echo_group(&Method::POST, "post"));
        routes.extend(cookie_group(&Method::POST, "post", POST_COOKIE, None));

        for (method, prefix) in [
            (Method::PUT, "put"),
            (Method::DELETE, "delete"),
            (Method::PATCH, "patch"),
        ] {
            routes.extend(echo_group(&method, prefix));
        }

        routes.push(RouteSpec::api(Method::HEAD, "head-text", EchoKind::Empty));
        routes.push(RouteSpec::api(Method::HEAD, "head-json", EchoKind::Empty));

        routes.extend(probe_group(&Method::GET));
        routes.extend(probe_group(&Method::POST));

        Self::new(routes)
    }

    /// GET/POST echo routes served behind the CORS policy
    pub fn cors() -> Self {
        let mut routes = Vec::new();
        routes.extend(echo_group(&Method::GET, "get"));
        routes.extend(cookie_group(&Method::GET, "get", GET_COOKIE, Some(CORS_PROBE_HEADER)));
        routes.extend(echo_group(&Method::POST, "post"));
        routes.extend(cookie_group(&Method::POST, "post", POST_COOKIE, None));
        Self::new(routes)
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Option<&RouteSpec> {
        match_route(method, path, &self.routes)
    }

    #[cfg(test)]
    pub fn routes(&self) -> &[RouteSpec] {
        &self.routes
    }
}

/// `{prefix}-text`, `-json`, `-return-headers` and `-return-body`
fn echo_group(method: &Method, prefix: &str) -> [RouteSpec; 4] {
    let route =
        |suffix: &str, kind| RouteSpec::api(method.clone(), &format!("{prefix}-{suffix}"), kind);

    [
        route("text", EchoKind::Text(HELLO_TEXT)),
        route(
            "json",
            EchoKind::Json {
                explicit_content_type: false,
            },
        ),
        route("return-headers", EchoKind::ReturnHeaders),
        route(
            "return-body",
            EchoKind::ReturnBody {
                content_length: *method == Method::POST,
            },
        ),
    ]
}

/// `{prefix}-set-cookie` and `{prefix}-check-cookie`
fn cookie_group(
    method: &Method,
    prefix: &str,
    cookie: FixtureCookie,
    extra_header: Option<(&'static str, &'static str)>,
) -> [RouteSpec; 2] {
    [
        RouteSpec::api(
            method.clone(),
            &format!("{prefix}-set-cookie"),
            EchoKind::SetCookie {
                cookie,
                extra_header,
            },
        ),
        RouteSpec::api(
            method.clone(),
            &format!("{prefix}-check-cookie"),
            EchoKind::CheckCookie(cookie),
        ),
    ]
}

/// Fixed-value `res-*` probes
fn probe_group(method: &Method) -> [RouteSpec; 3] {
    [
        RouteSpec::api(
            method.clone(),
            "res-json",
            EchoKind::Json {
                explicit_content_type: false,
            },
        ),
        RouteSpec::api(
            method.clone(),
            "res-json-content-type-json",
            EchoKind::Json {
                explicit_content_type: true,
            },
        ),
        RouteSpec::api(method.clone(), "res-text", EchoKind::Text(PROBE_TEXT)),
    ]
}
