//! Static file serving for the dist tree
//!
//! Serves built assets from disk with directory-style `index.html`
//! fallbacks. Served HTML documents get the live reload client script
//! injected before `</body>`.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;

use super::AppState;

/// Serve an asset from the dist tree.
pub(crate) async fn serve_asset(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let path = decode_request_path(uri.path());

    let Some(file_path) = resolve(&state.dist_dir, &path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let Ok(content) = tokio::fs::read(&file_path).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mime = mime_guess::from_path(&file_path).first_or_octet_stream();
    if mime == mime_guess::mime::TEXT_HTML {
        let html = inject_reload_script(&String::from_utf8_lossy(&content));
        return Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .body(Body::from(html))
            .unwrap();
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .body(Body::from(content))
        .unwrap()
}

/// Percent-decode a request path and strip the leading slash.
///
/// Decoding happens before traversal checks in `resolve`, so an encoded
/// `..` is still rejected.
fn decode_request_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().trim_start_matches('/').to_string()
}

/// Resolve a request path to a file under the dist tree.
///
/// Rejects traversal components; maps the root and extension-less
/// directory-style paths to `index.html`.
fn resolve(dist_dir: &Path, path: &str) -> Option<PathBuf> {
    let relative = Path::new(path);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let candidate = if path.is_empty() { dist_dir.join("index.html") } else { dist_dir.join(relative) };

    if candidate.is_file() {
        return Some(candidate);
    }

    // Directory-style URL: /guide -> /guide/index.html
    if relative.extension().is_none() {
        let index = candidate.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Insert the live reload script tag before `</body>`, or append it when
/// the document has no closing body tag.
fn inject_reload_script(html: &str) -> String {
    const TAG: &str = "<script src=\"/__livereload.js\"></script>";

    match html.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + TAG.len() + 1);
            out.push_str(&html[..idx]);
            out.push_str(TAG);
            out.push('\n');
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{}{}\n", html, TAG),
    }
}
