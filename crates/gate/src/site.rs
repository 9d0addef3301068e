//! Static file handler for the built website.
//!
//! This is the downstream content layer the gate forwards authorized requests to. It knows
//! nothing about authentication.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse as _, Response},
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone)]
pub struct SiteDir {
    root: PathBuf,
}

impl SiteDir {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path onto a file under the site root.
    ///
    /// `/` and paths ending in `/` map to that directory's `index.html`. Returns `None` for any
    /// path that could step outside the root (`..`, `.`, empty or encoded-slash segments).
    #[must_use]
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let trimmed = request_path.strip_prefix('/').unwrap_or(request_path);
        let wants_index = trimmed.is_empty() || trimmed.ends_with('/');
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

        let mut rel = PathBuf::new();
        if !trimmed.is_empty() {
            for raw in trimmed.split('/') {
                let segment = percent_decode(raw)?;
                if segment.is_empty()
                    || segment == "."
                    || segment == ".."
                    || segment.contains(['/', '\\', '\0'])
                {
                    return None;
                }
                rel.push(segment);
            }
        }
        if wants_index {
            rel.push(INDEX_FILE);
        }
        Some(self.root.join(rel))
    }
}

/// Decode `%XX` escapes. `None` on a truncated escape or non-UTF-8 result.
fn percent_decode(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = segment.get(i + 1..i + 3)?;
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// `Content-Type` for a file, by extension.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

/// Serve a file from the site directory. Used as the router fallback behind the gate.
///
/// `Content-Length` comes from the file's metadata. HEAD never opens the file; GET streams it.
pub async fn serve_site(State(site): State<Arc<SiteDir>>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD")],
            "Method not allowed",
        )
            .into_response();
    }

    let Some(path) = site.resolve(uri.path()) else {
        return not_found();
    };

    let meta = match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => meta,
        Ok(_) => return not_found(),
        Err(e) if e.kind() == ErrorKind::NotFound => return not_found(),
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "stat site file failed");
            return internal_error();
        }
    };

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type_for(&path)),
        ),
        (header::CONTENT_LENGTH, HeaderValue::from(meta.len())),
    ];

    if method == Method::HEAD {
        return (StatusCode::OK, headers).into_response();
    }

    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return not_found(),
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "open site file failed");
            return internal_error();
        }
    };

    (
        StatusCode::OK,
        headers,
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}
