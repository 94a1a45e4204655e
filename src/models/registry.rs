//! Model discovery and registration.
//!
//! # Responsibilities
//! - Walk a module's models directory and load every artifact file
//! - Derive each model's path from the artifact's directory
//! - Replace or remove single entries on dev-mode reload
//!
//! # Design Decisions
//! - Each artifact loads independently; failures are logged, never fatal
//! - An unreadable models root leaves the registry empty
//! - Entries are `Arc`s in a `DashMap`, so a reload is one atomic key swap

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Model, ModelCatalog};
use crate::observability::metrics;

/// Contents of an artifact file.
#[derive(Debug, Deserialize)]
struct ModelArtifact {
    model: String,
}

/// Errors loading a single artifact.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown model kind '{kind}' in {path}")]
    UnknownKind { kind: String, path: PathBuf },

    #[error("{0} is not inside the models directory")]
    OutsideRoot(PathBuf),
}

/// Path → model mapping for one module.
pub struct ModelRegistry {
    module: String,
    root: PathBuf,
    extension: String,
    catalog: Arc<ModelCatalog>,
    models: DashMap<String, Arc<dyn Model>>,
}

impl ModelRegistry {
    /// Create an empty registry rooted at `root`.
    pub fn new(
        module: impl Into<String>,
        root: impl Into<PathBuf>,
        extension: impl Into<String>,
        catalog: Arc<ModelCatalog>,
    ) -> Self {
        Self {
            module: module.into(),
            root: root.into(),
            extension: extension.into(),
            catalog,
            models: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, path: &str) -> Option<Arc<dyn Model>> {
        self.models.get(path).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.models.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.models.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Register a model directly, bypassing artifact files.
    pub fn insert(&self, path: impl Into<String>, model: Arc<dyn Model>) {
        self.models.insert(path.into(), model);
    }

    /// True for files this registry would load.
    pub fn is_artifact(&self, file: &Path) -> bool {
        file.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
    }

    /// Server-relative path for an artifact file: its directory under the root.
    pub fn model_path_for(&self, file: &Path) -> Option<String> {
        let relative = file.strip_prefix(&self.root).ok()?;
        let dir = relative.parent()?;
        let mut segments = Vec::new();
        for comp in dir.components() {
            match comp {
                Component::Normal(s) => segments.push(s.to_str()?.to_string()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(format!("/{}", segments.join("/")))
    }

    /// Walk the models directory and load every artifact.
    ///
    /// Returns the number of models registered.
    pub async fn load_all(&self) -> usize {
        let files = match self.artifact_files().await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(
                    module = %self.module,
                    root = %self.root.display(),
                    error = %e,
                    "Could not read models directory recursively"
                );
                return 0;
            }
        };

        for file in files {
            let contents = match tokio::fs::read(&file).await {
                Ok(contents) => contents,
                Err(source) => {
                    let e = ModelLoadError::Io { path: file.clone(), source };
                    tracing::warn!(module = %self.module, error = %e, "Could not load model");
                    continue;
                }
            };
            if let Err(e) = self.register_artifact(&file, &contents) {
                tracing::warn!(module = %self.module, error = %e, "Could not load model");
            }
        }

        metrics::record_models_loaded(&self.module, self.models.len());
        tracing::info!(module = %self.module, models = self.models.len(), "Models loaded");
        self.models.len()
    }

    /// Load (or reload) one artifact from disk.
    pub fn load_file(&self, file: &Path) -> Result<String, ModelLoadError> {
        let contents = std::fs::read(file).map_err(|source| ModelLoadError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        self.register_artifact(file, &contents)
    }

    /// Drop the model registered for an artifact that no longer exists.
    pub fn unload_file(&self, file: &Path) -> Option<String> {
        let path = self.model_path_for(file)?;
        self.models.remove(&path).map(|(path, _)| path)
    }

    fn register_artifact(&self, file: &Path, contents: &[u8]) -> Result<String, ModelLoadError> {
        let path = self
            .model_path_for(file)
            .ok_or_else(|| ModelLoadError::OutsideRoot(file.to_path_buf()))?;

        let artifact: ModelArtifact =
            serde_json::from_slice(contents).map_err(|source| ModelLoadError::Parse {
                path: file.to_path_buf(),
                source,
            })?;

        let model = self
            .catalog
            .instantiate(&artifact.model)
            .ok_or_else(|| ModelLoadError::UnknownKind {
                kind: artifact.model.clone(),
                path: file.to_path_buf(),
            })?;

        if let Some(init) = model.as_schedule_init() {
            init.on_schedule_init();
        }

        if self.models.insert(path.clone(), model).is_some() {
            tracing::info!(module = %self.module, path = %path, kind = %artifact.model, "Model reloaded");
        } else {
            tracing::debug!(module = %self.module, path = %path, kind = %artifact.model, "Model registered");
        }
        Ok(path)
    }

    async fn artifact_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut pending = vec![self.root.clone()];
        let mut first = true;

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if first => return Err(e),
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                    continue;
                }
            };
            first = false;

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(dir = %dir.display(), error = %e, "Directory listing interrupted");
                        break;
                    }
                };
                let path = entry.path();
                match entry.file_type().await {
                    Ok(t) if t.is_dir() => pending.push(path),
                    Ok(_) if self.is_artifact(&path) => files.push(path),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "Could not stat entry"),
                }
            }
        }

        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelError, ModelOutput, ModelRequest, ScheduleInit};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static INITS: AtomicUsize = AtomicUsize::new(0);

    struct Counting;

    #[async_trait]
    impl Model for Counting {
        async fn render(&self, _request: &ModelRequest) -> Result<ModelOutput, ModelError> {
            Ok(ModelOutput::default())
        }

        fn as_schedule_init(&self) -> Option<&dyn ScheduleInit> {
            Some(self)
        }
    }

    impl ScheduleInit for Counting {
        fn on_schedule_init(&self) {
            INITS.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn registry(root: &Path) -> ModelRegistry {
        let mut catalog = ModelCatalog::with_builtins();
        catalog.register("counting", || Arc::new(Counting) as Arc<dyn Model>);
        ModelRegistry::new("shop", root, "model", Arc::new(catalog))
    }

    fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_model_path_from_directory() {
        let reg = registry(Path::new("/srv/shop/models"));
        assert_eq!(
            reg.model_path_for(Path::new("/srv/shop/models/post/order/order.model")).as_deref(),
            Some("/post/order")
        );
        assert_eq!(
            reg.model_path_for(Path::new("/srv/shop/models/anything.model")).as_deref(),
            Some("/")
        );
        assert!(reg.model_path_for(Path::new("/elsewhere/x.model")).is_none());
    }

    #[tokio::test]
    async fn test_load_all_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "items/index/index.model", r#"{"model": "echo"}"#);
        write(root, "post/order/handler.model", r#"{"model": "echo"}"#);
        write(root, "post/order/handler.rs", "// source, ignored");
        write(root, "items/index/index.json", r#"{"title": "sidecar, ignored"}"#);
        write(root, "broken/broken.model", "not json");
        write(root, "unknown/unknown.model", r#"{"model": "nope"}"#);

        let reg = registry(root);
        assert_eq!(reg.load_all().await, 2);
        assert_eq!(reg.paths(), vec!["/items/index", "/post/order"]);
        assert!(!reg.contains("/broken"));
        assert!(!reg.contains("/unknown"));
    }

    #[tokio::test]
    async fn test_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(&dir.path().join("missing"));
        assert_eq!(reg.load_all().await, 0);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_reload_replaces_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let file = write(root, "stats/stats.model", r#"{"model": "echo"}"#);
        let reg = registry(root);

        assert_eq!(reg.load_file(&file).unwrap(), "/stats");
        let first = reg.get("/stats").unwrap();

        let before = INITS.load(Ordering::SeqCst);
        fs::write(&file, r#"{"model": "counting"}"#).unwrap();
        reg.load_file(&file).unwrap();
        assert!(INITS.load(Ordering::SeqCst) > before);
        assert!(!Arc::ptr_eq(&first, &reg.get("/stats").unwrap()));
        assert_eq!(reg.len(), 1);

        assert_eq!(reg.unload_file(&file).as_deref(), Some("/stats"));
        assert!(reg.is_empty());
    }
}
