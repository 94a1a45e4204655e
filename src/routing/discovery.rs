//! Module discovery.
//!
//! Every directory under the modules directory holding a `module.json` is a
//! module. A module with an unreadable or invalid descriptor is skipped with
//! a warning; an unreadable modules directory is a startup error.

use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::config::ModuleDescriptor;
use crate::context::ServerContext;
use crate::module::Module;

/// Load all modules, sorted by directory name.
pub async fn discover_modules(dir: &Path, context: &ServerContext) -> io::Result<Vec<Arc<Module>>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();

    let mut modules = Vec::new();
    for name in names {
        let root = dir.join(&name);
        let descriptor = match ModuleDescriptor::read(&root) {
            Ok(Some(descriptor)) => descriptor,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(module = %name, error = %e, "Skipping module");
                continue;
            }
        };
        tracing::trace!(module = %name, prefix = %descriptor.path, "Found module");
        modules.push(Arc::new(Module::load(&name, descriptor, context).await));
    }

    Ok(modules)
}
