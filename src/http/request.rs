//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Buffer the body once so it can be offered to several modules
//! - Reconstruct the client-facing origin (scheme + host)
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Forwarded scheme headers win over the URI scheme
//! - The session handle is taken from extensions, never created from headers

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::security::session::Session;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Scheme and host as the client addressed the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub scheme: String,
    pub host: String,
}

impl Origin {
    pub fn from_parts(uri: &Uri, headers: &HeaderMap) -> Self {
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| uri.scheme_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string());

        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());

        Self { scheme, host }
    }

    /// Host without port.
    pub fn hostname(&self) -> &str {
        if self.host.starts_with('[') {
            // IPv6 literal
            return self.host.split(']').next().map(|h| &h[1..]).unwrap_or(&self.host);
        }
        self.host.split(':').next().unwrap_or(&self.host)
    }

    /// `<scheme>://<host><prefix>`
    pub fn base_url(&self, prefix: &str) -> String {
        format!("{}://{}{}", self.scheme, self.host, prefix)
    }
}

/// A fully buffered request, cheap to clone between modules.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub session: Session,
    pub origin: Origin,
    pub request_id: String,
}

impl IncomingRequest {
    /// Buffer an axum request, failing if the body exceeds `limit` bytes.
    pub async fn buffer(request: Request<Body>, limit: usize) -> Result<Self, axum::Error> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, limit).await?;
        let session = Session::from_extensions(&parts.extensions);
        let origin = Origin::from_parts(&parts.uri, &parts.headers);
        let request_id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            session,
            origin,
            request_id,
        })
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }
}
