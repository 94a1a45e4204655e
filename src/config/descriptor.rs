//! Module descriptors (`module.json`).
//!
//! ```json
//! { "path": "/shop/", "dirs": { "models": "handlers", "static": "public" } }
//! ```
//!
//! Directory overrides are resolved against the module root; missing ones
//! default to `<root>/models`, `<root>/static` and `<root>/views`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// File name marking a directory as a module.
pub const DESCRIPTOR_FILE: &str = "module.json";

/// Errors reading a module descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed descriptor {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("module path '{0}' must start and end with '/'")]
    InvalidPath(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DirOverrides {
    models: Option<PathBuf>,
    #[serde(rename = "static")]
    static_files: Option<PathBuf>,
    views: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawDescriptor {
    path: String,
    #[serde(default)]
    dirs: DirOverrides,
}

/// Resolved directories of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDirs {
    pub models: PathBuf,
    pub static_files: PathBuf,
    pub views: PathBuf,
}

/// A validated module descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// URL prefix, starting and ending with `/`.
    pub path: String,
    pub dirs: ModuleDirs,
}

impl ModuleDescriptor {
    /// Parse descriptor text for a module rooted at `root`.
    pub fn parse(root: &Path, text: &str) -> Result<Self, DescriptorError> {
        let raw: RawDescriptor = serde_json::from_str(text).map_err(|source| DescriptorError::Parse {
            path: root.join(DESCRIPTOR_FILE),
            source,
        })?;

        if !raw.path.starts_with('/') || !raw.path.ends_with('/') {
            return Err(DescriptorError::InvalidPath(raw.path));
        }

        let resolve = |over: Option<PathBuf>, default: &str| match over {
            Some(p) if p.is_absolute() => p,
            Some(p) => root.join(p),
            None => root.join(default),
        };

        Ok(Self {
            path: raw.path,
            dirs: ModuleDirs {
                models: resolve(raw.dirs.models, "models"),
                static_files: resolve(raw.dirs.static_files, "static"),
                views: resolve(raw.dirs.views, "views"),
            },
        })
    }

    /// Read `<root>/module.json`. `Ok(None)` when the directory is not a module.
    pub fn read(root: &Path) -> Result<Option<Self>, DescriptorError> {
        let path = root.join(DESCRIPTOR_FILE);
        match std::fs::read_to_string(&path) {
            Ok(text) => Self::parse(root, &text).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(DescriptorError::Io { path, source }),
        }
    }
}
