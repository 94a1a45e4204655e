//! Dynamic per-path page handlers ("models").
//!
//! # Data Flow
//! ```text
//! Startup:
//!     <models>/**/<any>.model  (artifact: {"model": "<kind>"})
//!     → registry.rs (walk, derive path from directory, look up kind)
//!     → catalog.rs (construct instance, no arguments)
//!     → path → Arc<dyn Model>
//!
//! Dev mode:
//!     watcher.rs (notify) → registry.rs reloads the single changed artifact
//!
//! Per request:
//!     page environment "models" list
//!     → invoke.rs (spawn every render, join all, keep list order)
//!     → ModelOutput per model → merged into the page environment
//! ```
//!
//! # Design Decisions
//! - Directory structure mirrors URL structure; one model per directory
//! - Optional hooks are separate traits exposed through `as_*` accessors
//! - A model that fails to load is logged and its path left unregistered

pub mod builtin;
pub mod catalog;
pub mod invoke;
pub mod registry;
pub mod watcher;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::environment::Environment;
use crate::security::session::Session;

pub use catalog::ModelCatalog;
pub use registry::ModelRegistry;

/// Base URL information handed to models before rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParams {
    /// `<scheme>://<host><module prefix>`
    pub base_url: String,
    /// Base URL plus the page path.
    pub full_url: String,
}

/// Request data visible to models.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub method: Method,
    pub uri: Uri,
    /// Module-relative page path (`/items/index`).
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub session: Session,
    pub params: UrlParams,
}

impl ModelRequest {
    /// Decoded query-string fields. Later duplicates win.
    pub fn query(&self) -> HashMap<String, String> {
        self.uri
            .query()
            .map(|q| decode_fields(q.as_bytes()))
            .unwrap_or_default()
    }

    /// Decoded `application/x-www-form-urlencoded` body fields.
    pub fn form(&self) -> HashMap<String, String> {
        let is_form = self
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);
        if is_form {
            decode_fields(&self.body)
        } else {
            HashMap::new()
        }
    }
}

fn decode_fields(input: &[u8]) -> HashMap<String, String> {
    url::form_urlencoded::parse(input).into_owned().collect()
}

/// Raw response body emitted by viewless endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawOutput {
    Text(String),
    Binary(Bytes),
}

impl IntoResponse for RawOutput {
    fn into_response(self) -> Response {
        let (content_type, body) = match self {
            RawOutput::Text(text) => ("text/html; charset=utf-8", Body::from(text)),
            RawOutput::Binary(bytes) => ("application/octet-stream", Body::from(bytes)),
        };
        let mut response = Response::new(body);
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        response
    }
}

/// Result of one model render.
///
/// `env` is merged into the page environment. An `errcode` key in the merged
/// environment turns the response into that error status.
#[derive(Debug, Clone, Default)]
pub struct ModelOutput {
    pub env: Environment,
    pub raw: Option<RawOutput>,
}

impl ModelOutput {
    pub fn env(env: Environment) -> Self {
        Self { env, raw: None }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            env: Environment::new(),
            raw: Some(RawOutput::Text(text.into())),
        }
    }

    pub fn binary(bytes: impl Into<Bytes>) -> Self {
        Self {
            env: Environment::new(),
            raw: Some(RawOutput::Binary(bytes.into())),
        }
    }

    /// Signal an error status instead of a page.
    pub fn error(code: u16) -> Self {
        let mut env = Environment::new();
        env.insert(crate::environment::keys::ERROR_CODE.into(), code.into());
        Self { env, raw: None }
    }
}

/// Errors a model may return from `render`.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model failed: {0}")]
    Failed(String),

    #[error("model responded with status {0}")]
    Status(StatusCode),
}

/// A dynamic handler bound to one module-relative path.
#[async_trait]
pub trait Model: Send + Sync {
    /// Produce this model's part of the page environment.
    async fn render(&self, request: &ModelRequest) -> Result<ModelOutput, ModelError>;

    fn as_set_params(&self) -> Option<&dyn SetParams> {
        None
    }

    fn as_render_after(&self) -> Option<&dyn RenderAfter> {
        None
    }

    fn as_schedule_init(&self) -> Option<&dyn ScheduleInit> {
        None
    }
}

impl fmt::Debug for dyn Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("set_params", &self.as_set_params().is_some())
            .field("render_after", &self.as_render_after().is_some())
            .field("schedule_init", &self.as_schedule_init().is_some())
            .finish()
    }
}

/// Receives base URL information before `render`.
pub trait SetParams: Send + Sync {
    fn set_params(&self, params: &UrlParams);
}

/// Replaces the default send of a rendered page.
pub trait RenderAfter: Send + Sync {
    fn render_after(&self, html: String, request: &ModelRequest) -> Response;
}

/// One-time setup after the model is loaded (and after each dev reload).
pub trait ScheduleInit: Send + Sync {
    fn on_schedule_init(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, content_type: Option<&str>, body: &'static str) -> ModelRequest {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(ct).unwrap());
        }
        ModelRequest {
            method: Method::POST,
            uri: uri.parse().unwrap(),
            path: "/post/order".into(),
            headers,
            body: Bytes::from_static(body.as_bytes()),
            session: Session::default(),
            params: UrlParams::default(),
        }
    }

    #[test]
    fn test_query_and_form_fields() {
        let req = request(
            "/shop/post/order?sku=a%20b&qty=1",
            Some("application/x-www-form-urlencoded"),
            "name=Ann+Lee&qty=2",
        );
        let query = req.query();
        assert_eq!(query["sku"], "a b");
        let form = req.form();
        assert_eq!(form["name"], "Ann Lee");
        assert_eq!(form["qty"], "2");
    }

    #[test]
    fn test_form_requires_urlencoded_body() {
        let req = request("/shop/post/order", Some("application/json"), "{\"a\":1}");
        assert!(req.form().is_empty());
    }

    #[test]
    fn test_error_output_sets_errcode() {
        let out = ModelOutput::error(404);
        assert_eq!(out.env["errcode"], serde_json::json!(404));
        assert!(out.raw.is_none());
    }
}
