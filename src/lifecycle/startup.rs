//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the server context from validated configuration
//! - Discover and load every module (and its models)
//! - Start model watchers in development mode
//! - Hand back a server ready to bind
//!
//! # Design Decisions
//! - An unreadable modules directory is fatal; a broken module is not
//! - Modules load in name order, which is also dispatch order
//! - Watchers live as long as the returned `Site`

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use notify::RecommendedWatcher;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::context::ServerContext;
use crate::http::SiteServer;
use crate::models::watcher::{ModelEvent, ModelWatcher};
use crate::models::ModelCatalog;
use crate::module::Module;
use crate::observability::metrics;
use crate::routing::{discover_modules, ModuleRouter};
use crate::security::users::{NoUserDirectory, StaticUserDirectory, UserDirectory};

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("could not read modules directory {path}: {source}")]
    Modules {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A loaded site: the server plus the watchers keeping dev reload alive.
pub struct Site {
    pub server: SiteServer,
    pub watchers: Vec<RecommendedWatcher>,
}

/// User directory implied by the config: the static table if it has users.
pub fn user_directory(config: &ServerConfig) -> Arc<dyn UserDirectory> {
    if config.users.is_empty() {
        Arc::new(NoUserDirectory)
    } else {
        Arc::new(StaticUserDirectory::from_config(&config.users))
    }
}

/// Load every module and build the server.
pub async fn build_site(
    config: ServerConfig,
    catalog: ModelCatalog,
    users: Arc<dyn UserDirectory>,
) -> Result<Site, StartupError> {
    let context = Arc::new(ServerContext::new(config, catalog, users));
    let modules_dir = context.config().site.modules_dir.clone();

    let modules = discover_modules(&modules_dir, &context)
        .await
        .map_err(|source| StartupError::Modules {
            path: modules_dir.clone(),
            source,
        })?;

    let watchers = if context.dev() {
        modules.iter().filter_map(watch_models).collect()
    } else {
        Vec::new()
    };

    tracing::info!(
        modules = modules.len(),
        watchers = watchers.len(),
        dev = context.dev(),
        "Site loaded"
    );

    let router = ModuleRouter::from_modules(context.clone(), modules);
    Ok(Site {
        server: SiteServer::new(context, router),
        watchers,
    })
}

fn watch_models(module: &Arc<Module>) -> Option<RecommendedWatcher> {
    let registry = module.models().clone();
    let (watcher, mut events) = ModelWatcher::new(module.name(), registry.clone());
    let watcher = match watcher.run() {
        Ok(watcher) => watcher,
        Err(e) => {
            tracing::warn!(module = %module.name(), error = %e, "Model watcher not started");
            return None;
        }
    };

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let module = match &event {
                ModelEvent::Reloaded { module, path } => {
                    tracing::info!(module = %module, path = %path, "Model hot-reloaded");
                    module
                }
                ModelEvent::Removed { module, path } => {
                    tracing::info!(module = %module, path = %path, "Model removed");
                    module
                }
            };
            metrics::record_models_loaded(module, registry.len());
        }
    });

    Some(watcher)
}
