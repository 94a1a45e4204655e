//! Logs and metrics.
//!
//! # Data Flow
//! ```text
//! ModuleRouter::dispatch   → site_requests_total, site_request_duration_seconds
//! invoke_all (per model)   → site_model_invocations_total, site_model_duration_seconds
//! ModelRegistry / watcher  → site_models_loaded
//! every subsystem          → tracing events (pretty or JSON on stdout)
//! ```
//!
//! # Design Decisions
//! - Request logs carry the `x-request-id` assigned at the edge
//! - Metrics stay off unless `observability.metrics_enabled` is set

pub mod logging;
pub mod metrics;
