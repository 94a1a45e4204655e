//! Static asset serving.
//!
//! # Responsibilities
//! - Map a module-relative path under a static subdirectory to a file
//! - Read the whole file and respond with a content type from the extension
//!
//! # Design Decisions
//! - Absence is reported to the caller, which decides between 404 and
//!   yielding to the next module
//! - Read failures after a successful probe are errors (500), not 404

use std::path::{Path, PathBuf};

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue};
use axum::response::Response;

use crate::module::paths::join_under;

/// Result of a static lookup.
#[derive(Debug)]
pub enum StaticOutcome {
    /// No such file.
    Missing,
    /// File contents and content type.
    Found { body: Bytes, content_type: &'static str },
    /// File exists but could not be read.
    Failed(std::io::Error),
}

/// Serves files from a module's static directory.
#[derive(Debug, Clone)]
pub struct StaticAssetResolver {
    root: PathBuf,
}

impl StaticAssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True if a regular file exists at the module-relative path.
    pub async fn exists(&self, path: &str) -> bool {
        match join_under(&self.root, path) {
            Some(file) => tokio::fs::metadata(file).await.map(|m| m.is_file()).unwrap_or(false),
            None => false,
        }
    }

    /// Look up and read a file. `request_path` decides the content type.
    pub async fn load(&self, path: &str, request_path: &str) -> StaticOutcome {
        let Some(file) = join_under(&self.root, path) else {
            return StaticOutcome::Missing;
        };
        match tokio::fs::metadata(&file).await {
            Ok(meta) if meta.is_file() => {}
            _ => return StaticOutcome::Missing,
        }
        match tokio::fs::read(&file).await {
            Ok(data) => StaticOutcome::Found {
                body: Bytes::from(data),
                content_type: content_type(request_path),
            },
            Err(e) => StaticOutcome::Failed(e),
        }
    }
}

/// Build the response for a found file.
pub fn file_response(body: Bytes, content_type: &'static str) -> Response {
    let mut response = Response::new(Body::from(body));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Content type for a path, by extension.
pub fn content_type(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "map" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}
