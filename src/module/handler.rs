//! Page resolution and rendering for one module.
//!
//! # Resolution (first match wins)
//! ```text
//! strip module prefix
//!     → /static[/...]                    → 404
//!     → /<static subdir>/...             → static file (or yield / 404)
//!     → trailing '/'                     → append "index"
//!     → redirect table hit               → 301
//!     → /post/... with a model           → render viewless (view ignored)
//!     → view exists                      → render page
//!     → /post/... without a model        → 404
//!     → view directory                   → 302 to path + '/'
//!     → root module                      → yield to next module
//!     → otherwise                        → 404
//! ```
//!
//! # Rendering
//! ```text
//! compose environment → gate → set_params + model sidecars
//!     → invoke models (join all) → merge outputs in list order
//!     → errcode? → error page
//!     → viewless? → raw output
//!     → template → render_after hook or HTML
//! ```

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde_json::Value;

use crate::context::ServerContext;
use crate::environment::{self, keys, sidecar, Environment, EnvironmentComposer};
use crate::http::request::IncomingRequest;
use crate::http::response;
use crate::models::invoke::{invoke_all, Invocation};
use crate::models::{ModelRequest, RawOutput, UrlParams};
use crate::module::static_files::{self, StaticOutcome};
use crate::module::{is_static_root, Module, POST_NAMESPACE};
use crate::security::permissions::GateDecision;

/// Outcome of offering a request to a module.
pub enum Dispatch {
    /// The module produced a response.
    Handled(Response),
    /// The module does not own the path; try the next one.
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageKind {
    View,
    Viewless,
}

/// Request handler bound to one module.
pub struct PageRenderer {
    module: Arc<Module>,
    context: Arc<ServerContext>,
    composer: EnvironmentComposer,
}

impl PageRenderer {
    pub fn new(module: Arc<Module>, context: Arc<ServerContext>) -> Self {
        let composer = EnvironmentComposer::new(context.dev());
        Self {
            module,
            context,
            composer,
        }
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    /// Resolve and answer a request routed to this module.
    pub async fn handle(&self, request: &IncomingRequest) -> Dispatch {
        let module = &self.module;
        let path = module.relative_path(request.path());

        if is_static_root(&path) {
            return Dispatch::Handled(self.error(StatusCode::NOT_FOUND, request).await);
        }

        if module.static_dir_for(&path).is_some() {
            return self.serve_static(request, &path).await;
        }

        let mut page = path;
        if page.ends_with('/') {
            page.push_str("index");
        }

        if let Some(location) = module.redirects().resolve(&page, module.prefix()) {
            tracing::debug!(module = %module.name(), path = %page, location = %location, "Redirect table hit");
            return Dispatch::Handled(self.redirect(StatusCode::MOVED_PERMANENTLY, &location, request).await);
        }

        let is_post = page.starts_with(POST_NAMESPACE);
        if is_post && module.models().contains(&page) {
            return Dispatch::Handled(self.render_page(request, &page, PageKind::Viewless).await);
        }

        let templates = module.templates();
        if templates.view_exists(&page).await {
            return Dispatch::Handled(self.render_page(request, &page, PageKind::View).await);
        }

        if is_post {
            tracing::trace!(module = %module.name(), path = %page, "No model for post endpoint");
            return Dispatch::Handled(self.error(StatusCode::NOT_FOUND, request).await);
        }

        if !page.ends_with('/') && templates.is_view_directory(&page).await {
            let location = format!("{}/", request.path());
            return Dispatch::Handled(self.redirect(StatusCode::FOUND, &location, request).await);
        }

        if module.owns_root() {
            tracing::trace!(module = %module.name(), path = %request.path(), "Yielding to next module");
            return Dispatch::Next;
        }

        tracing::trace!(
            module = %module.name(),
            path = %request.path(),
            "View does not exist"
        );
        Dispatch::Handled(self.error(StatusCode::NOT_FOUND, request).await)
    }

    async fn serve_static(&self, request: &IncomingRequest, path: &str) -> Dispatch {
        match self.module.assets().load(path, request.path()).await {
            StaticOutcome::Found { body, content_type } => {
                Dispatch::Handled(static_files::file_response(body, content_type))
            }
            StaticOutcome::Missing if self.module.owns_root() => Dispatch::Next,
            StaticOutcome::Missing => {
                tracing::trace!(module = %self.module.name(), path = %request.path(), "Static file does not exist");
                Dispatch::Handled(self.error(StatusCode::NOT_FOUND, request).await)
            }
            StaticOutcome::Failed(e) => {
                tracing::warn!(
                    module = %self.module.name(),
                    path = %request.path(),
                    error = %e,
                    "Error reading static file"
                );
                Dispatch::Handled(self.error(StatusCode::INTERNAL_SERVER_ERROR, request).await)
            }
        }
    }

    async fn render_page(&self, request: &IncomingRequest, page: &str, kind: PageKind) -> Response {
        let module = &self.module;
        let base_url = request.origin.base_url(module.prefix());
        let mut env = self.composer.compose(module, &base_url, page).await;

        let session = &request.session;
        if !environment::flag(&env, keys::USE_REDIRECT) {
            session.set_return_to(request.path());
        }

        match self.context.gate().check(&env, session, page).await {
            GateDecision::Allow => {}
            GateDecision::Login(location) => {
                return self.redirect(StatusCode::FOUND, &location, request).await;
            }
            GateDecision::Forbidden => return self.error(StatusCode::FORBIDDEN, request).await,
            GateDecision::Internal => return self.error(StatusCode::INTERNAL_SERVER_ERROR, request).await,
        }

        let params = UrlParams {
            full_url: format!("{}{}", base_url, &page[1..]),
            base_url,
        };
        let model_request = Arc::new(ModelRequest {
            method: request.method.clone(),
            uri: request.uri.clone(),
            path: page.to_string(),
            headers: request.headers.clone(),
            body: request.body.clone(),
            session: session.clone(),
            params: params.clone(),
        });

        let invocations = self.prepare_models(&mut env, page, &params).await;
        let mut raw = None;
        if !invocations.is_empty() {
            match invoke_all(invocations, model_request.clone(), self.context.model_timeout()).await {
                Ok(outputs) => {
                    for output in outputs {
                        environment::merge(&mut env, output.env);
                        if output.raw.is_some() {
                            raw = output.raw;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        request_id = %request.request_id,
                        module = %module.name(),
                        path = %page,
                        error = %e,
                        "Page models did not complete"
                    );
                    return self.error(e.status(), request).await;
                }
            }
        }

        if let Some(status) = error_code(&env) {
            return self.error(status, request).await;
        }

        if kind == PageKind::Viewless {
            return raw_response(raw, &env);
        }

        let html = match module.templates().render(page, &env) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(module = %module.name(), path = %page, error = %e, "Rendering failed");
                return self.error(StatusCode::INTERNAL_SERVER_ERROR, request).await;
            }
        };

        if let Some(model) = module.models().get(page) {
            if let Some(after) = model.as_render_after() {
                return after.render_after(html, &model_request);
            }
        }
        Html(html).into_response()
    }

    /// Resolve the `models` list to registered models, in order.
    ///
    /// Calls `set_params` and merges the sidecar of every model that is not
    /// the page's own. Unknown or repeated entries are skipped.
    async fn prepare_models(&self, env: &mut Environment, page: &str, params: &UrlParams) -> Vec<Invocation> {
        let registry = self.module.models();
        let mut invocations: Vec<Invocation> = Vec::new();

        for model_path in environment::string_list(env, keys::MODELS) {
            if invocations.iter().any(|inv| inv.path == model_path) {
                continue;
            }
            let Some(model) = registry.get(&model_path) else {
                tracing::warn!(module = %self.module.name(), model = %model_path, page = %page, "Model not found for page");
                continue;
            };

            if let Some(hook) = model.as_set_params() {
                hook.set_params(params);
            }

            if model_path != page {
                if let Some(path) = sidecar::sidecar_path(&self.module.dirs().models, &model_path) {
                    if let Some(layer) = sidecar::read_layer(&path).await {
                        environment::merge(env, layer);
                    }
                }
            }

            invocations.push(Invocation { path: model_path, model });
        }
        invocations
    }

    async fn redirect(&self, status: StatusCode, location: &str, request: &IncomingRequest) -> Response {
        match response::redirect(status, location) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(location = %location, error = %e, "Invalid redirect location");
                self.error(StatusCode::INTERNAL_SERVER_ERROR, request).await
            }
        }
    }

    async fn error(&self, status: StatusCode, request: &IncomingRequest) -> Response {
        self.context.error_pages().render(status, &request.origin).await
    }
}

/// Status requested through the `errcode` key, if any.
fn error_code(env: &Environment) -> Option<StatusCode> {
    let code = match env.get(keys::ERROR_CODE)? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    if code == 0 {
        return None;
    }
    Some(
        u16::try_from(code)
            .ok()
            .and_then(|c| StatusCode::from_u16(c).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    )
}

/// Body of a viewless endpoint: typed raw output, else the `raw` key, else empty.
fn raw_response(raw: Option<RawOutput>, env: &Environment) -> Response {
    if let Some(raw) = raw {
        return raw.into_response();
    }
    match env.get("raw") {
        Some(Value::String(text)) => RawOutput::Text(text.clone()).into_response(),
        Some(Value::Null) | None => RawOutput::Text(String::new()).into_response(),
        Some(other) => RawOutput::Text(other.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_code_parsing() {
        let env = |v| environment::from_value(v).unwrap();
        assert_eq!(error_code(&env(json!({ "errcode": 404 }))), Some(StatusCode::NOT_FOUND));
        assert_eq!(error_code(&env(json!({ "errcode": "403" }))), Some(StatusCode::FORBIDDEN));
        assert_eq!(error_code(&env(json!({ "errcode": 0 }))), None);
        assert_eq!(error_code(&env(json!({ "errcode": 70000 }))), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(error_code(&env(json!({}))), None);
    }

    #[tokio::test]
    async fn test_raw_response_fallbacks() {
        let env = environment::from_value(json!({ "raw": { "ok": true } })).unwrap();
        let response = raw_response(None, &env);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"ok":true}"#);

        let response = raw_response(Some(RawOutput::Binary(vec![1u8, 2, 3].into())), &Environment::new());
        assert_eq!(response.headers()["content-type"], "application/octet-stream");
    }
}
