//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a single fallback handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Buffer requests and hand them to the module router
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::context::ServerContext;
use crate::http::request::{IncomingRequest, MakeRequestUuid, Origin};
use crate::lifecycle::shutdown::signalled;
use crate::routing::ModuleRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ModuleRouter>,
    pub context: Arc<ServerContext>,
}

/// HTTP server for the site.
pub struct SiteServer {
    router: Router,
    state: AppState,
}

impl SiteServer {
    /// Create a new HTTP server over loaded modules.
    pub fn new(context: Arc<ServerContext>, modules: ModuleRouter) -> Self {
        let state = AppState {
            router: Arc::new(modules),
            context,
        };
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let request_secs = state.context.config().timeouts.request_secs;
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The axum router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            modules = self.state.router.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                signalled(shutdown).await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Buffers the request and dispatches it to the owning module.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let origin = Origin::from_parts(request.uri(), request.headers());
    let limit = state.context.config().listener.max_body_bytes;

    let request = match IncomingRequest::buffer(request, limit).await {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Could not read request body");
            return state
                .context
                .error_pages()
                .render(StatusCode::PAYLOAD_TOO_LARGE, &origin)
                .await;
        }
    };

    state.router.dispatch(&request).await
}
