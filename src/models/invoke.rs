//! Concurrent model invocation.
//!
//! Every referenced model is spawned as its own task, then joined. The page
//! continues only once all of them have produced output, or stops at the
//! first failure. Outputs come back in invocation order regardless of which
//! task finished first.
//!
//! Without a timeout a model that never completes holds its page forever;
//! other requests are unaffected. With a timeout the stalled task is
//! aborted and the page fails with 504. When any model fails, the sibling
//! tasks still running are aborted too.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use futures_util::future::try_join_all;
use thiserror::Error;

use crate::models::{Model, ModelError, ModelOutput, ModelRequest};
use crate::observability::metrics;

/// One model to run for a page.
#[derive(Clone)]
pub struct Invocation {
    pub path: String,
    pub model: Arc<dyn Model>,
}

/// Why a join did not complete.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("model {path} failed: {source}")]
    Failed {
        path: String,
        #[source]
        source: ModelError,
    },

    #[error("model {path} panicked")]
    Panicked { path: String },

    #[error("model {path} did not finish within {timeout:?}")]
    TimedOut { path: String, timeout: Duration },
}

impl InvokeError {
    /// Status the page responds with.
    pub fn status(&self) -> StatusCode {
        match self {
            InvokeError::Failed { source: ModelError::Status(code), .. } => *code,
            InvokeError::Failed { .. } | InvokeError::Panicked { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            InvokeError::TimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

/// Run all invocations concurrently and collect their outputs in order.
pub async fn invoke_all(
    invocations: Vec<Invocation>,
    request: Arc<ModelRequest>,
    timeout: Option<Duration>,
) -> Result<Vec<ModelOutput>, InvokeError> {
    let mut aborts = Vec::with_capacity(invocations.len());
    let pending: Vec<_> = invocations
        .into_iter()
        .map(|Invocation { path, model }| {
            let req = request.clone();
            let handle = tokio::spawn(async move { model.render(&req).await });
            aborts.push(handle.abort_handle());
            join_one(path, handle, timeout)
        })
        .collect();

    let joined = try_join_all(pending).await;
    if joined.is_err() {
        for abort in &aborts {
            abort.abort();
        }
    }
    joined
}

async fn join_one(
    path: String,
    mut handle: tokio::task::JoinHandle<Result<ModelOutput, ModelError>>,
    timeout: Option<Duration>,
) -> Result<ModelOutput, InvokeError> {
    let start = Instant::now();
    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                tracing::warn!(model = %path, timeout = ?limit, "Model timed out");
                metrics::record_model_invocation(&path, "timeout", start);
                return Err(InvokeError::TimedOut { path, timeout: limit });
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(Ok(output)) => {
            metrics::record_model_invocation(&path, "ok", start);
            Ok(output)
        }
        Ok(Err(source)) => {
            tracing::warn!(model = %path, error = %source, "Model render failed");
            metrics::record_model_invocation(&path, "error", start);
            Err(InvokeError::Failed { path, source })
        }
        Err(e) => {
            tracing::error!(model = %path, error = %e, "Model task panicked");
            metrics::record_model_invocation(&path, "panic", start);
            Err(InvokeError::Panicked { path })
        }
    }
}
