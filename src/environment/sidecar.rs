//! JSON sidecar files.
//!
//! A page at `/a/b` owns the sidecar `<models>/a/b/b.json`. The same layout
//! is used for per-model sidecars. Missing files are silent; unreadable or
//! malformed files are logged and treated as absent data.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::environment::{self, Environment};
use crate::module::paths::join_under;

/// Location of the sidecar for a module-relative page or model path.
pub fn sidecar_path(models_dir: &Path, page: &str) -> Option<PathBuf> {
    let name = page.rsplit('/').next().filter(|n| !n.is_empty())?;
    join_under(models_dir, &format!("{}/{}.json", page.trim_end_matches('/'), name))
}

/// Read a JSON object file as an environment layer.
pub async fn read_layer(path: &Path) -> Option<Environment> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read JSON sidecar");
            return None;
        }
    };
    parse_layer(path, &bytes)
}

/// Blocking variant used while modules are being constructed.
pub fn read_layer_blocking(path: &Path) -> Option<Environment> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read JSON file");
            return None;
        }
    };
    parse_layer(path, &bytes)
}

fn parse_layer(path: &Path, bytes: &[u8]) -> Option<Environment> {
    match serde_json::from_slice(bytes) {
        Ok(value) => {
            let layer = environment::from_value(value);
            if layer.is_none() {
                tracing::warn!(path = %path.display(), "JSON file is not an object, ignoring");
            }
            layer
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "JSON is formatted incorrectly");
            None
        }
    }
}
