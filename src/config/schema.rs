//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the site server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Module discovery and page rendering settings.
    pub site: SiteConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Static user table for permission checks.
    pub users: Vec<UserConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Module discovery and rendering settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory containing one subdirectory per module.
    pub modules_dir: PathBuf,

    /// Server-wide default environment (JSON object). Optional on disk.
    pub default_env: PathBuf,

    /// Server-wide views, holding the error templates.
    pub views_dir: PathBuf,

    /// Extension of view templates, without the dot.
    pub view_extension: String,

    /// Extension of model artifact files, without the dot.
    pub model_extension: String,

    /// Where `requiresLogin` pages send anonymous users.
    pub login_path: String,

    /// Contact address on error pages. Defaults to `webmaster@<host>`.
    pub support_email: Option<String>,

    /// Development mode: template reload, model hot reload.
    pub dev: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            modules_dir: PathBuf::from("modules"),
            default_env: PathBuf::from("defaultEnv.json"),
            views_dir: PathBuf::from("views"),
            view_extension: "html".to_string(),
            model_extension: "model".to_string(),
            login_path: "/login".to_string(),
            support_email: None,
            dev: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Per-model render timeout in seconds. 0 disables it.
    pub model_secs: u64,
}

impl TimeoutConfig {
    pub fn model_timeout(&self) -> Option<Duration> {
        (self.model_secs > 0).then(|| Duration::from_secs(self.model_secs))
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            model_secs: 0,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// One entry of the static user table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    /// Session user id.
    pub id: String,

    /// Permissions held by the user.
    #[serde(default)]
    pub permissions: Vec<String>,
}
