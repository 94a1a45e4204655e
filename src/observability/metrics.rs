//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define server metrics (requests, latency, model invocations)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `site_requests_total` (counter): requests by module, status
//! - `site_request_duration_seconds` (histogram): latency by module
//! - `site_model_invocations_total` (counter): model renders by model, outcome
//! - `site_model_duration_seconds` (histogram): model render latency
//! - `site_models_loaded` (gauge): registered models per module
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are module names and model paths, never raw request paths

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(module: &str, status: u16, start: Instant) {
    counter!(
        "site_requests_total",
        "module" => module.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("site_request_duration_seconds", "module" => module.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_model_invocation(model: &str, outcome: &'static str, start: Instant) {
    counter!(
        "site_model_invocations_total",
        "model" => model.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("site_model_duration_seconds", "model" => model.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_models_loaded(module: &str, count: usize) {
    gauge!("site_models_loaded", "module" => module.to_string()).set(count as f64);
}
