//! Server-wide context.
//!
//! Built once at startup and passed by reference into module and router
//! construction. Holds everything modules share: configuration, the
//! server-wide default environment, the model catalog, the permission gate
//! and the error pages.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::environment::{sidecar, Environment};
use crate::http::response::ErrorPages;
use crate::models::ModelCatalog;
use crate::security::permissions::PermissionGate;
use crate::security::users::UserDirectory;
use crate::templates::JinjaTemplates;

pub struct ServerContext {
    config: ServerConfig,
    default_env: Environment,
    catalog: Arc<ModelCatalog>,
    gate: PermissionGate,
    error_pages: ErrorPages,
}

impl ServerContext {
    pub fn new(config: ServerConfig, catalog: ModelCatalog, users: Arc<dyn UserDirectory>) -> Self {
        let default_env = sidecar::read_layer_blocking(&config.site.default_env).unwrap_or_default();
        tracing::debug!(
            path = %config.site.default_env.display(),
            keys = default_env.len(),
            "Server default environment loaded"
        );

        let error_templates = JinjaTemplates::new(
            config.site.views_dir.clone(),
            config.site.view_extension.clone(),
            config.site.dev,
        );
        let error_pages = ErrorPages::new(Arc::new(error_templates), config.site.support_email.clone());
        let gate = PermissionGate::new(users, config.site.login_path.clone());

        Self {
            config,
            default_env,
            catalog: Arc::new(catalog),
            gate,
            error_pages,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn default_env(&self) -> &Environment {
        &self.default_env
    }

    pub fn catalog(&self) -> &Arc<ModelCatalog> {
        &self.catalog
    }

    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    pub fn error_pages(&self) -> &ErrorPages {
        &self.error_pages
    }

    pub fn dev(&self) -> bool {
        self.config.site.dev
    }

    pub fn model_timeout(&self) -> Option<Duration> {
        self.config.timeouts.model_timeout()
    }
}
