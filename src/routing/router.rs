//! Module lookup and dispatch.
//!
//! # Responsibilities
//! - Hold one page handler per module, in registration order
//! - Offer each request to the first module whose prefix matches
//! - Continue with the next matching module when a module yields
//! - Answer 404 when no module takes the request
//!
//! # Design Decisions
//! - Registration order is module directory name order
//! - Only the root module (`/`) ever yields
//! - Immutable after construction (thread-safe without locks)

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use axum::response::Response;

use crate::context::ServerContext;
use crate::http::request::IncomingRequest;
use crate::module::{Dispatch, Module, PageRenderer};
use crate::observability::metrics;
use crate::routing::matcher::{Matcher, PathPrefixMatcher};

struct Route {
    matcher: PathPrefixMatcher,
    handler: PageRenderer,
}

/// Dispatches requests to modules by path prefix.
pub struct ModuleRouter {
    routes: Vec<Route>,
    context: Arc<ServerContext>,
}

impl ModuleRouter {
    pub fn new(context: Arc<ServerContext>) -> Self {
        Self {
            routes: Vec::new(),
            context,
        }
    }

    /// Build a router from modules, preserving their order.
    pub fn from_modules(context: Arc<ServerContext>, modules: Vec<Arc<Module>>) -> Self {
        let mut router = Self::new(context);
        for module in modules {
            router.register(module);
        }
        router
    }

    /// Append a module. Later modules are tried after earlier ones.
    pub fn register(&mut self, module: Arc<Module>) {
        tracing::info!(module = %module.name(), prefix = %module.prefix(), "Registered module");
        self.routes.push(Route {
            matcher: PathPrefixMatcher::new(module.prefix()),
            handler: PageRenderer::new(module, self.context.clone()),
        });
    }

    pub fn modules(&self) -> impl Iterator<Item = &Arc<Module>> {
        self.routes.iter().map(|r| r.handler.module())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Answer a request.
    pub async fn dispatch(&self, request: &IncomingRequest) -> Response {
        let start = Instant::now();
        let path = request.path();

        for route in self.routes.iter().filter(|r| r.matcher.matches(path)) {
            let module = route.handler.module().name();
            tracing::debug!(
                request_id = %request.request_id,
                module = %module,
                method = %request.method,
                path = %path,
                "Dispatching request"
            );
            match route.handler.handle(request).await {
                Dispatch::Handled(response) => {
                    metrics::record_request(module, response.status().as_u16(), start);
                    return response;
                }
                Dispatch::Next => continue,
            }
        }

        tracing::debug!(request_id = %request.request_id, path = %path, "No module handled request");
        let response = self
            .context
            .error_pages()
            .render(StatusCode::NOT_FOUND, &request.origin)
            .await;
        metrics::record_request("none", StatusCode::NOT_FOUND.as_u16(), start);
        response
    }
}
