//! Static file serving module
//!
//! Serves the `/es` directory and the single file mounted at `/`.

use crate::config::StaticConfig;
use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response};
use std::path::{Path, PathBuf};
use tokio::fs;

/// URL prefix of the static directory
pub const ES_PREFIX: &str = "/es";

const INDEX_FILE: &str = "index.html";

/// Serve a request that matched no echo route
pub async fn serve(config: &StaticConfig, method: &Method, path: &str) -> Response<Full<Bytes>> {
    let is_head = *method == Method::HEAD;
    if *method != Method::GET && !is_head {
        return http::build_404_response();
    }

    let loaded = if path == "/" {
        load_single_file(Path::new(&config.index_file)).await
    } else if let Some(relative) = strip_es_prefix(path) {
        load_from_directory(&config.es_dir, relative).await
    } else {
        None
    };

    match loaded {
        Some((content, content_type)) => http::build_file_response(content, content_type, is_head),
        None => http::build_404_response(),
    }
}

/// Path below `/es`, `None` when the request is outside the mount
fn strip_es_prefix(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(ES_PREFIX)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix('/')
    }
}

/// Load a file from the static directory, `index.html` for directories
pub async fn load_from_directory(
    static_dir: &str,
    relative_path: &str,
) -> Option<(Vec<u8>, &'static str)> {
    // Security: ensure file_path is within static_dir
    let static_dir_canonical = match Path::new(static_dir).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{static_dir}': {e}"
            ));
            return None;
        }
    };

    let mut file_path: PathBuf = static_dir_canonical.join(relative_path.trim_start_matches('/'));
    if file_path.is_dir() {
        file_path.push(INDEX_FILE);
    }

    // File not found is common (404), no need to log at warning level
    let Ok(file_path_canonical) = file_path.canonicalize() else {
        return None;
    };
    if !file_path_canonical.starts_with(&static_dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {relative_path} -> {}",
            file_path_canonical.display()
        ));
        return None;
    }

    load_single_file(&file_path_canonical).await
}

/// Load a single file
pub async fn load_single_file(path: &Path) -> Option<(Vec<u8>, &'static str)> {
    match fs::read(path).await {
        Ok(content) => Some((content, mime::content_type_for(path))),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            }
            None
        }
    }
}
