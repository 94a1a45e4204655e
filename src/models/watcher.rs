//! Development-mode model reloading.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::models::ModelRegistry;

/// A change applied to a registry by the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    Reloaded { module: String, path: String },
    Removed { module: String, path: String },
}

/// Watches one module's models directory and reloads changed artifacts.
pub struct ModelWatcher {
    module: String,
    registry: Arc<ModelRegistry>,
    events_tx: mpsc::UnboundedSender<ModelEvent>,
}

impl ModelWatcher {
    /// Create a new ModelWatcher.
    ///
    /// Returns the watcher and a receiver for applied changes.
    pub fn new(
        module: impl Into<String>,
        registry: Arc<ModelRegistry>,
    ) -> (Self, mpsc::UnboundedReceiver<ModelEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                module: module.into(),
                registry,
                events_tx,
            },
            events_rx,
        )
    }

    /// Start watching. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let root: PathBuf = self.registry.root().to_path_buf();
        let registry = self.registry.clone();
        let module = self.module.clone();
        let tx = self.events_tx.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for event in apply(&module, &registry, &event) {
                        let _ = tx.send(event);
                    }
                }
                Err(e) => tracing::error!(module = %module, "Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        tracing::info!(module = %self.module, path = ?root, "Model watcher started");
        Ok(watcher)
    }
}

/// Apply one filesystem event to the registry.
fn apply(module: &str, registry: &ModelRegistry, event: &Event) -> Vec<ModelEvent> {
    let mut applied = Vec::new();
    for file in event.paths.iter().filter(|p| registry.is_artifact(p)) {
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) if file.exists() => {
                match registry.load_file(file) {
                    Ok(path) => applied.push(ModelEvent::Reloaded {
                        module: module.to_string(),
                        path,
                    }),
                    Err(e) => tracing::warn!(module = %module, error = %e, "Could not reload model"),
                }
            }
            EventKind::Remove(_) | EventKind::Modify(_) => {
                if let Some(path) = registry.unload_file(file) {
                    tracing::info!(module = %module, path = %path, "Model unregistered");
                    applied.push(ModelEvent::Removed {
                        module: module.to_string(),
                        path,
                    });
                }
            }
            _ => {}
        }
    }
    applied
}
