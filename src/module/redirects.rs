//! Per-module redirect table (`<models>/redirects.json`).
//!
//! Keys are module-relative request paths after index normalization
//! (`/old/` is looked up as `/old/index`). Values are absolute URLs or
//! module-relative paths.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::environment::sidecar;

/// File name of the redirect sidecar under the models directory.
pub const REDIRECTS_FILE: &str = "redirects.json";

/// Read-only mapping from module-relative path to redirect target.
#[derive(Debug, Clone, Default)]
pub struct RedirectTable {
    entries: HashMap<String, String>,
}

impl RedirectTable {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Load the table from a models directory. Missing or malformed files yield an empty table.
    pub fn load(models_dir: &Path) -> Self {
        let path = models_dir.join(REDIRECTS_FILE);
        let Some(layer) = sidecar::read_layer_blocking(&path) else {
            return Self::default();
        };

        let mut entries = HashMap::new();
        for (from, to) in layer {
            match to {
                Value::String(target) if !target.is_empty() => {
                    entries.insert(from, target);
                }
                other => {
                    tracing::warn!(path = %path.display(), from = %from, target = %other, "Ignoring non-string redirect target");
                }
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `Location` for a redirected path, if any.
    ///
    /// Absolute targets are returned verbatim; anything else is joined to the module prefix.
    pub fn resolve(&self, path: &str, prefix: &str) -> Option<String> {
        let target = self.entries.get(path)?;
        if target.starts_with("http://") || target.starts_with("https://") {
            Some(target.clone())
        } else {
            Some(format!("{}{}", prefix, target))
        }
    }
}
