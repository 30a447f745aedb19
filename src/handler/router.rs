//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: buffers the body, notifies the
//! observer, applies the CORS policy, then dispatches to the route table or
//! the static files.

use crate::config::{Config, ListenerKind, StaticConfig};
use crate::handler::cors::{CorsDecision, CorsPolicy};
use crate::handler::{echo, static_files};
use crate::http;
use crate::logger::{
    self, AccessLogEntry, LoggingObserver, NoopObserver, RequestObserver, RequestSummary,
};
use crate::routing::RouteTable;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::http::request::Parts;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Read-only state shared by every connection of one listener
pub struct DispatchState {
    pub routes: RouteTable,
    pub cors: Option<CorsPolicy>,
    pub statics: Option<StaticConfig>,
    pub observer: Arc<dyn RequestObserver>,
    /// Access log format, `None` when access logging is off
    pub access_log_format: Option<String>,
}

impl DispatchState {
    /// Build the state for the listener selected at startup
    pub fn for_listener(kind: ListenerKind, config: &Config) -> Self {
        let access_log_format = config
            .logging
            .access_log
            .then(|| config.logging.access_log_format.clone());

        match kind {
            ListenerKind::Primary => {
                let observer: Arc<dyn RequestObserver> = if config.logging.request_dump {
                    Arc::new(LoggingObserver)
                } else {
                    Arc::new(NoopObserver)
                };
                Self {
                    routes: RouteTable::primary(),
                    cors: None,
                    statics: Some(config.static_files.clone()),
                    observer,
                    access_log_format,
                }
            }
            ListenerKind::Cors => Self {
                routes: RouteTable::cors(),
                cors: Some(CorsPolicy::local_development()),
                statics: None,
                observer: Arc::new(NoopObserver),
                access_log_format,
            },
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<DispatchState>,
    remote_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    // 1. Buffer the body, unreadable bodies count as empty
    let body = read_body(body).await;

    // 2. Let the observer see the request before anything can change it
    state.observer.observe(&RequestSummary {
        url: &parts.uri,
        headers: &parts.headers,
        body: &body,
    });

    // 3. Dispatch
    let response = dispatch(&parts, body, &state).await;

    // 4. Access log
    if let Some(format) = &state.access_log_format {
        let mut entry = AccessLogEntry::from_request(&parts, remote_addr);
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.latency = started.elapsed();
        logger::log_access(&entry, format);
    }

    Ok(response)
}

async fn read_body<B>(body: B) -> Bytes
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            logger::log_warning(&format!("Unreadable request body treated as empty: {e}"));
            Bytes::new()
        }
    }
}

async fn dispatch(parts: &Parts, body: Bytes, state: &DispatchState) -> Response<Full<Bytes>> {
    let allowed_origin = match &state.cors {
        Some(policy) => match policy.evaluate(parts) {
            CorsDecision::Bypass => None,
            CorsDecision::Rejected => {
                return http::build_empty_response(StatusCode::FORBIDDEN);
            }
            CorsDecision::Preflight(origin) => return policy.preflight_response(origin),
            CorsDecision::Allowed(origin) => Some((policy, origin)),
        },
        None => None,
    };

    let mut response = match state.routes.lookup(&parts.method, parts.uri.path()) {
        Some(route) => echo::respond(route, parts, body),
        None => match &state.statics {
            Some(statics) => static_files::serve(statics, &parts.method, parts.uri.path()).await,
            None => http::build_404_response(),
        },
    };

    if let Some((policy, origin)) = allowed_origin {
        policy.apply(&mut response, origin);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::{
        ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, HOST, ORIGIN,
        SET_COOKIE,
    };
    use hyper::Method;
    use std::sync::Mutex;

    /// Observer recording what it was shown
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, Vec<(String, String)>, Bytes)>>,
    }

    impl RequestObserver for Recorder {
        fn observe(&self, summary: &RequestSummary<'_>) {
            let headers = summary
                .header_pairs()
                .map(|(name, value)| (name.to_string(), value))
                .collect();
            self.seen
                .lock()
                .unwrap()
                .push((summary.url.to_string(), headers, summary.body.clone()));
        }
    }

    fn primary_state(observer: Arc<dyn RequestObserver>) -> Arc<DispatchState> {
        Arc::new(DispatchState {
            routes: RouteTable::primary(),
            cors: None,
            statics: None,
            observer,
            access_log_format: None,
        })
    }

    fn cors_state() -> Arc<DispatchState> {
        Arc::new(DispatchState {
            routes: RouteTable::cors(),
            cors: Some(CorsPolicy::local_development()),
            statics: None,
            observer: Arc::new(NoopObserver),
            access_log_format: Some("json".to_string()),
        })
    }

    async fn send(
        state: &Arc<DispatchState>,
        req: Request<Full<Bytes>>,
    ) -> (StatusCode, hyper::HeaderMap, Bytes) {
        let response = handle_request(req, Arc::clone(state), None).await.unwrap();
        let (parts, body) = response.into_parts();
        let body = body.collect().await.unwrap().to_bytes();
        (parts.status, parts.headers, body)
    }

    fn request(method: Method, path: &str, body: &'static str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    #[tokio::test]
    async fn test_every_text_route() {
        let state = primary_state(Arc::new(NoopObserver));
        for (method, path) in [
            (Method::GET, "/api/get-text"),
            (Method::POST, "/api/post-text"),
            (Method::PUT, "/api/put-text"),
            (Method::DELETE, "/api/delete-text"),
            (Method::PATCH, "/api/patch-text"),
        ] {
            let (status, _, body) = send(&state, request(method, path, "")).await;
            assert_eq!(status, StatusCode::OK, "{path}");
            assert_eq!(body, "hello world", "{path}");
        }
    }

    #[tokio::test]
    async fn test_every_json_route() {
        let state = primary_state(Arc::new(NoopObserver));
        for (method, path) in [
            (Method::GET, "/api/get-json"),
            (Method::POST, "/api/post-json"),
            (Method::PUT, "/api/put-json"),
            (Method::DELETE, "/api/delete-json"),
            (Method::PATCH, "/api/patch-json"),
            (Method::GET, "/api/res-json"),
            (Method::POST, "/api/res-json"),
        ] {
            let (status, _, body) = send(&state, request(method, path, "")).await;
            assert_eq!(status, StatusCode::OK, "{path}");
            let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(value, serde_json::json!({"key": "value"}), "{path}");
        }
    }

    #[tokio::test]
    async fn test_return_body_round_trip() {
        let state = primary_state(Arc::new(NoopObserver));
        let payload = "{\"name\":\"lyla\",\"n\":[1,2,3]}";

        let (_, headers, body) =
            send(&state, request(Method::POST, "/api/post-return-body", payload)).await;
        assert_eq!(body, payload);
        assert_eq!(headers[CONTENT_LENGTH], payload.len().to_string().as_str());

        for (method, path) in [
            (Method::GET, "/api/get-return-body"),
            (Method::PUT, "/api/put-return-body"),
            (Method::DELETE, "/api/delete-return-body"),
            (Method::PATCH, "/api/patch-return-body"),
        ] {
            let (_, _, body) = send(&state, request(method, path, payload)).await;
            assert_eq!(body, payload, "{path}");
        }
    }

    #[tokio::test]
    async fn test_cookie_round_trip() {
        let state = primary_state(Arc::new(NoopObserver));

        let (_, headers, _) = send(&state, request(Method::GET, "/api/get-set-cookie", "")).await;
        let cookie = headers[SET_COOKIE].to_str().unwrap().to_string();

        let with_cookie = Request::get("/api/get-check-cookie")
            .header(COOKIE, cookie)
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (status, _, _) = send(&state, with_cookie).await;
        assert_ne!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let wrong = Request::get("/api/get-check-cookie")
            .header(COOKIE, "foo-get=wrong")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (status, _, _) = send(&state, wrong).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _, _) = send(&state, request(Method::GET, "/api/get-check-cookie", "")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_post_check_cookie_statuses() {
        let state = primary_state(Arc::new(NoopObserver));
        let check = |cookie: Option<&'static str>| {
            let mut builder = Request::post("/api/post-check-cookie");
            if let Some(cookie) = cookie {
                builder = builder.header(COOKIE, cookie);
            }
            builder.body(Full::new(Bytes::new())).unwrap()
        };

        let (status, _, _) = send(&state, check(Some("foo-post=bar"))).await;
        assert_eq!(status, StatusCode::OK);

        for cookie in [Some("foo-post=wrong"), Some("foo-get=bar"), None] {
            let (status, _, _) = send(&state, check(cookie)).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{cookie:?}");
        }
    }

    #[tokio::test]
    async fn test_explicit_json_content_type_for_get_and_post() {
        let state = primary_state(Arc::new(NoopObserver));
        for method in [Method::GET, Method::POST] {
            let (status, headers, body) = send(
                &state,
                request(method.clone(), "/api/res-json-content-type-json", ""),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "{method}");
            assert_eq!(headers[CONTENT_TYPE], "application/json", "{method}");
            let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(value, serde_json::json!({"key": "value"}));
        }
    }

    #[tokio::test]
    async fn test_unknown_route_and_wrong_method_are_404() {
        let state = primary_state(Arc::new(NoopObserver));
        for (method, path) in [
            (Method::GET, "/api/missing"),
            (Method::GET, "/api/post-text"),
            (Method::PUT, "/api/get-set-cookie"),
            (Method::GET, "/"),
        ] {
            let (status, headers, body) = send(&state, request(method, path, "")).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
            assert_eq!(headers[CONTENT_TYPE], "text/plain");
            assert_eq!(body, "404 page not found");
        }
    }

    #[tokio::test]
    async fn test_observer_sees_each_request_once() {
        let recorder = Arc::new(Recorder::default());
        let state = primary_state(recorder.clone());

        let req = Request::post("/api/post-return-body?trace=1")
            .header("x-trace", "abc")
            .body(Full::new(Bytes::from_static(b"payload")))
            .unwrap();
        let (status, _, body) = send(&state, req).await;

        // The observer reading the body must not starve the handler
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "payload");

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (url, headers, body) = &seen[0];
        assert_eq!(url, "/api/post-return-body?trace=1");
        assert_eq!(headers, &vec![("x-trace".to_string(), "abc".to_string())]);
        assert_eq!(body, "payload");
    }

    #[tokio::test]
    async fn test_observer_sees_unmatched_requests() {
        let recorder = Arc::new(Recorder::default());
        let state = primary_state(recorder.clone());

        let (status, _, _) = send(&state, request(Method::GET, "/nowhere", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(recorder.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cors_listener_routes() {
        let state = cors_state();

        let (status, headers, body) = send(&state, request(Method::GET, "/api/get-text", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hello world");
        // No Origin header: not a CORS request
        assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

        for (method, path) in [
            (Method::PUT, "/api/put-text"),
            (Method::GET, "/api/res-json"),
            (Method::HEAD, "/api/head-text"),
        ] {
            let (status, _, _) = send(&state, request(method, path, "")).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        }
    }

    #[tokio::test]
    async fn test_cors_allowed_origin_gets_headers_even_on_500() {
        let state = cors_state();
        let req = Request::get("/api/get-check-cookie")
            .header(HOST, "localhost:7070")
            .header(ORIGIN, "http://localhost:3000")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let (status, headers, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
        assert_eq!(headers["access-control-allow-credentials"], "true");
        assert_eq!(headers["access-control-expose-headers"], "X-Cors,Set-Cookie");
    }

    #[tokio::test]
    async fn test_cors_preflight_and_rejection() {
        let state = cors_state();

        let preflight = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/post-set-cookie")
            .header(HOST, "localhost:7070")
            .header(ORIGIN, "http://localhost:8080")
            .header("access-control-request-method", "POST")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (status, headers, _) = send(&state, preflight).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(headers["access-control-allow-methods"], "GET,POST");

        let foreign = Request::post("/api/post-set-cookie")
            .header(HOST, "localhost:7070")
            .header(ORIGIN, "http://example.com")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (status, headers, body) = send(&state, foreign).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(headers.get(SET_COOKIE).is_none());
        assert!(body.is_empty());
    }
}
