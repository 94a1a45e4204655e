//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, extensions and paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("{field} must be a bare extension without dots, got '{value}'")]
    Extension { field: &'static str, value: String },

    #[error("login path must start with '/', got '{0}'")]
    LoginPath(String),

    #[error("log format must be 'pretty' or 'json', got '{0}'")]
    LogFormat(String),

    #[error("duplicate user id '{0}'")]
    DuplicateUser(String),
}

/// Check a configuration, collecting every error.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(obs.metrics_address.clone()));
    }
    if obs.log_format != "pretty" && obs.log_format != "json" {
        errors.push(ValidationError::LogFormat(obs.log_format.clone()));
    }

    for (field, value) in [
        ("view_extension", &config.site.view_extension),
        ("model_extension", &config.site.model_extension),
    ] {
        if value.is_empty() || value.contains('.') {
            errors.push(ValidationError::Extension { field, value: value.clone() });
        }
    }

    if !config.site.login_path.starts_with('/') && !config.site.login_path.starts_with("http") {
        errors.push(ValidationError::LoginPath(config.site.login_path.clone()));
    }

    let mut seen = HashSet::new();
    for user in &config.users {
        if !seen.insert(user.id.as_str()) {
            errors.push(ValidationError::DuplicateUser(user.id.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
