//! Route matching module
//!
//! Exact (method, path) matching against the route table.

use hyper::Method;

use super::table::RouteSpec;

/// Find the first route registered for this method and path
///
/// A path registered only under another method does not match.
pub fn match_route<'a>(
    method: &Method,
    path: &str,
    routes: &'a [RouteSpec],
) -> Option<&'a RouteSpec> {
    routes
        .iter()
        .find(|route| route.method == *method && match_path(&route.path, path))
}

/// Check if a request path matches a registered path
pub fn match_path(registered: &str, path: &str) -> bool {
    path == registered
}
