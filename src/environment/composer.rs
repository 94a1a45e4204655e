//! Page environment composition.
//!
//! # Layers (in order)
//! 1. Deep copy of the module default environment
//! 2. Request values: `baseurl`, `models` placeholder (and `dev` in dev mode)
//! 3. `mainjs` / `css` when `<static>/js<page>.js` / `<static>/css<page>.css` exist
//! 4. The page JSON sidecar
//! 5. The page's own model, appended to `models`
//!
//! Model outputs are merged later by the page renderer, after the gate.

use serde_json::Value;

use crate::environment::{self, keys, sidecar, Environment};
use crate::module::Module;

/// Builds per-request environments for one module.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentComposer {
    dev: bool,
}

impl EnvironmentComposer {
    pub fn new(dev: bool) -> Self {
        Self { dev }
    }

    /// Compose the environment for `page` (module-relative, index-normalized).
    pub async fn compose(&self, module: &Module, base_url: &str, page: &str) -> Environment {
        let mut env = module.default_env().clone();

        let mut request = Environment::new();
        request.insert(keys::BASE_URL.into(), Value::from(base_url));
        request.insert(keys::MODELS.into(), Value::Array(Vec::new()));
        if self.dev {
            request.insert(keys::DEV.into(), Value::Bool(true));
        }
        environment::merge(&mut env, request);

        let assets = module.assets();
        if assets.exists(&format!("js{}.js", page)).await {
            env.insert(
                keys::MAIN_JS.into(),
                Value::from(format!("{}js{}.js", module.prefix(), page)),
            );
        }
        if assets.exists(&format!("css{}.css", page)).await {
            let sheet = Value::from(format!("{}css{}.css", module.prefix(), page));
            match env.get_mut(keys::CSS) {
                Some(Value::Array(list)) => list.push(sheet),
                _ => {
                    env.insert(keys::CSS.into(), Value::Array(vec![sheet]));
                }
            }
        }

        if let Some(path) = sidecar::sidecar_path(&module.dirs().models, page) {
            if let Some(layer) = sidecar::read_layer(&path).await {
                environment::merge(&mut env, layer);
            }
        }

        if module.models().contains(page) {
            match env.get_mut(keys::MODELS) {
                Some(Value::Array(list)) => list.push(Value::from(page)),
                _ => {
                    env.insert(keys::MODELS.into(), Value::Array(vec![Value::from(page)]));
                }
            }
        }

        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModuleDescriptor, ServerConfig};
    use crate::context::ServerContext;
    use crate::models::ModelCatalog;
    use crate::security::users::NoUserDirectory;
    use serde_json::json;
    use std::fs;
    use std::sync::Arc;

    async fn module(dir: &std::path::Path) -> Module {
        let root = dir.join("shop");
        let write = |rel: &str, body: &str| {
            let p = root.join(rel);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(p, body).unwrap();
        };
        write("models/env.json", r#"{"css": ["/shop/css/site.css"], "models": ["/widgets/cart"], "title": "Shop"}"#);
        write("static/js/items/index.js", "");
        write("static/css/items/index.css", "");
        write("models/items/index/index.json", r#"{"title": "Items", "css": ["extra.css"]}"#);
        write("models/items/index/index.model", r#"{"model": "echo"}"#);
        write("models/broken/broken.json", "{ nope");

        let context = ServerContext::new(ServerConfig::default(), ModelCatalog::with_builtins(), Arc::new(NoUserDirectory));
        let descriptor = ModuleDescriptor::parse(&root, r#"{"path": "/shop/"}"#).unwrap();
        Module::load("shop", descriptor, &context).await
    }

    #[tokio::test]
    async fn test_full_layering() {
        let dir = tempfile::tempdir().unwrap();
        let module = module(dir.path()).await;
        let env = EnvironmentComposer::new(false)
            .compose(&module, "http://example.com/shop/", "/items/index")
            .await;

        assert_eq!(env["baseurl"], json!("http://example.com/shop/"));
        assert_eq!(env["title"], json!("Items"));
        assert_eq!(env["mainjs"], json!("/shop/js/items/index.js"));
        assert_eq!(
            env["css"],
            json!(["/shop/css/site.css", "/shop/css/items/index.css", "extra.css"])
        );
        assert_eq!(env["models"], json!(["/widgets/cart", "/items/index"]));
        assert!(env.get("dev").is_none());
    }

    #[tokio::test]
    async fn test_plain_page_and_bad_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let module = module(dir.path()).await;
        let env = EnvironmentComposer::new(true)
            .compose(&module, "http://example.com/shop/", "/broken")
            .await;

        assert_eq!(env["title"], json!("Shop"));
        assert!(env.get("mainjs").is_none());
        assert_eq!(env["css"], json!(["/shop/css/site.css"]));
        assert_eq!(env["models"], json!(["/widgets/cart"]));
        assert_eq!(env["dev"], json!(true));
    }

    #[tokio::test]
    async fn test_default_env_is_copied() {
        let dir = tempfile::tempdir().unwrap();
        let module = module(dir.path()).await;
        let composer = EnvironmentComposer::new(false);
        let _ = composer.compose(&module, "http://a/shop/", "/items/index").await;
        assert_eq!(module.default_env()["css"], json!(["/shop/css/site.css"]));
        assert_eq!(module.default_env()["models"], json!(["/widgets/cart"]));
    }
}
