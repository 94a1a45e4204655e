//! Modules: routable units owning one URL prefix.
//!
//! # Data Flow
//! ```text
//! modules/<name>/module.json
//!     → Module::load
//!         → static subdirectory names (static dir listing)
//!         → redirects.rs (<models>/redirects.json)
//!         → default env (server default + <models>/env.json)
//!         → ModelRegistry::load_all (<models>/**)
//!         → templates (<views>)
//!     → handler.rs (PageRenderer, one per module)
//! ```
//!
//! # Design Decisions
//! - Everything but the model mapping is immutable after load
//! - Module-relative paths keep their leading `/` (`/shop/a` → `/a`)

pub mod handler;
pub mod paths;
pub mod redirects;
pub mod static_files;

use std::path::Path;
use std::sync::Arc;

use crate::config::{ModuleDescriptor, ModuleDirs};
use crate::context::ServerContext;
use crate::environment::{self, sidecar, Environment};
use crate::models::ModelRegistry;
use crate::templates::{JinjaTemplates, TemplateEngine};

pub use handler::{Dispatch, PageRenderer};
pub use redirects::RedirectTable;
pub use static_files::StaticAssetResolver;

/// Path segment reserved for the static root itself.
pub const STATIC_ROOT: &str = "/static";

/// Prefix of viewless, model-only endpoints.
pub const POST_NAMESPACE: &str = "/post/";

/// File name of the per-module default environment under the models directory.
pub const MODULE_ENV_FILE: &str = "env.json";

/// A loaded module.
pub struct Module {
    name: String,
    prefix: String,
    dirs: ModuleDirs,
    static_dirs: Vec<String>,
    redirects: RedirectTable,
    default_env: Environment,
    models: Arc<ModelRegistry>,
    templates: Arc<dyn TemplateEngine>,
    assets: StaticAssetResolver,
}

impl Module {
    /// Load a module from its descriptor, including all of its models.
    pub async fn load(name: &str, descriptor: ModuleDescriptor, context: &ServerContext) -> Self {
        let site = &context.config().site;
        let templates = JinjaTemplates::new(descriptor.dirs.views.clone(), site.view_extension.clone(), site.dev);
        Self::with_templates(name, descriptor, context, Arc::new(templates)).await
    }

    /// Load a module with a caller-supplied template engine.
    pub async fn with_templates(
        name: &str,
        descriptor: ModuleDescriptor,
        context: &ServerContext,
        templates: Arc<dyn TemplateEngine>,
    ) -> Self {
        let ModuleDescriptor { path: prefix, dirs } = descriptor;

        let static_dirs = list_static_dirs(&dirs.static_files);
        let redirects = RedirectTable::load(&dirs.models);

        let mut default_env = context.default_env().clone();
        if let Some(layer) = sidecar::read_layer_blocking(&dirs.models.join(MODULE_ENV_FILE)) {
            environment::merge(&mut default_env, layer);
        }

        let models = Arc::new(ModelRegistry::new(
            name,
            dirs.models.clone(),
            context.config().site.model_extension.clone(),
            context.catalog().clone(),
        ));
        models.load_all().await;

        tracing::info!(
            module = %name,
            prefix = %prefix,
            static_dirs = ?static_dirs,
            redirects = redirects.len(),
            models = models.len(),
            "Module loaded"
        );

        Self {
            name: name.to_string(),
            prefix,
            assets: StaticAssetResolver::new(dirs.static_files.clone()),
            dirs,
            static_dirs,
            redirects,
            default_env,
            models,
            templates,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn dirs(&self) -> &ModuleDirs {
        &self.dirs
    }

    pub fn static_dirs(&self) -> &[String] {
        &self.static_dirs
    }

    pub fn redirects(&self) -> &RedirectTable {
        &self.redirects
    }

    pub fn default_env(&self) -> &Environment {
        &self.default_env
    }

    pub fn models(&self) -> &Arc<ModelRegistry> {
        &self.models
    }

    pub fn templates(&self) -> &dyn TemplateEngine {
        self.templates.as_ref()
    }

    pub fn assets(&self) -> &StaticAssetResolver {
        &self.assets
    }

    /// True for the module mounted at `/`, which yields unknown paths to later modules.
    pub fn owns_root(&self) -> bool {
        self.prefix == "/"
    }

    /// Module-relative form of a request path under this module's prefix.
    pub fn relative_path(&self, request_path: &str) -> String {
        let start = self.prefix.len() - 1;
        let tail = request_path.get(start..).unwrap_or("/");
        let tail = if tail.is_empty() { "/" } else { tail };
        paths::collapse_slashes(tail)
    }

    /// Recognized static subdirectory the path starts in, if any.
    pub fn static_dir_for(&self, path: &str) -> Option<&str> {
        self.static_dirs
            .iter()
            .find(|dir| {
                path.strip_prefix('/')
                    .and_then(|rest| rest.strip_prefix(dir.as_str()))
                    .map(|rest| rest.starts_with('/'))
                    .unwrap_or(false)
            })
            .map(String::as_str)
    }
}

/// True if the path begins with the static root marker.
///
/// A plain prefix test: `/statistics` is refused as well.
pub fn is_static_root(path: &str) -> bool {
    path.starts_with(STATIC_ROOT)
}

fn list_static_dirs(root: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::trace!(root = %root.display(), error = %e, "No static directory");
            return Vec::new();
        }
    };
    let mut dirs: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect();
    dirs.sort();
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::models::ModelCatalog;
    use crate::security::users::NoUserDirectory;
    use serde_json::json;
    use std::fs;

    async fn load(prefix: &str) -> (tempfile::TempDir, Module) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("shop");
        fs::create_dir_all(root.join("static/css")).unwrap();
        fs::create_dir_all(root.join("static/img")).unwrap();
        fs::write(root.join("static/robots.txt"), "").unwrap();
        fs::create_dir_all(root.join("models")).unwrap();
        fs::write(root.join("models/env.json"), r#"{"css": ["module.css"], "title": "Shop"}"#).unwrap();
        fs::write(dir.path().join("defaultEnv.json"), r#"{"css": ["site.css"], "title": "Site"}"#).unwrap();

        let mut config = ServerConfig::default();
        config.site.default_env = dir.path().join("defaultEnv.json");
        let context = ServerContext::new(config, ModelCatalog::new(), Arc::new(NoUserDirectory));
        let descriptor = ModuleDescriptor::parse(&root, &format!(r#"{{"path": "{}"}}"#, prefix)).unwrap();
        let module = Module::load("shop", descriptor, &context).await;
        (dir, module)
    }

    #[tokio::test]
    async fn test_load_merges_default_env() {
        let (_dir, module) = load("/shop/").await;
        assert_eq!(module.default_env()["css"], json!(["site.css", "module.css"]));
        assert_eq!(module.default_env()["title"], json!("Shop"));
        assert_eq!(module.static_dirs(), &["css".to_string(), "img".to_string()]);
        assert!(!module.owns_root());
    }

    #[tokio::test]
    async fn test_relative_paths() {
        let (_dir, module) = load("/shop/").await;
        assert_eq!(module.relative_path("/shop/items/"), "/items/");
        assert_eq!(module.relative_path("/shop/"), "/");
        assert_eq!(module.relative_path("/shop//a//b"), "/a/b");
    }

    #[tokio::test]
    async fn test_static_dir_match() {
        let (_dir, module) = load("/").await;
        assert!(module.owns_root());
        assert_eq!(module.static_dir_for("/css/site.css"), Some("css"));
        assert_eq!(module.static_dir_for("/css"), None);
        assert_eq!(module.static_dir_for("/cssx/a"), None);
        assert_eq!(module.static_dir_for("/robots.txt/"), None);
    }

    #[test]
    fn test_static_root_guard() {
        assert!(is_static_root("/static"));
        assert!(is_static_root("/static/css/site.css"));
        assert!(is_static_root("/statistics"));
        assert!(!is_static_root("/css/static"));
    }
}
