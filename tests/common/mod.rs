//! Shared utilities for integration testing.
//!
//! Builds a site on disk in a temp directory and loads it through the same
//! startup path the binary uses.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use site_server::config::{ServerConfig, UserConfig};
use site_server::lifecycle::{build_site, user_directory, Site};
use site_server::models::{Model, ModelCatalog, ModelError, ModelOutput, ModelRequest};

/// A site laid out in a temporary directory.
pub struct SiteFixture {
    dir: TempDir,
    pub users: Vec<UserConfig>,
}

impl SiteFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("modules")).unwrap();
        Self { dir, users: Vec::new() }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Create a module directory with a descriptor mounted at `prefix`.
    pub fn module(&self, name: &str, prefix: &str) -> ModuleFixture {
        let root = self.dir.path().join("modules").join(name);
        fs::create_dir_all(root.join("models")).unwrap();
        fs::create_dir_all(root.join("views")).unwrap();
        fs::create_dir_all(root.join("static")).unwrap();
        write(&root.join("module.json"), &format!(r#"{{ "path": "{}" }}"#, prefix));
        ModuleFixture { root }
    }

    /// Write a server-wide view (error pages live here).
    pub fn server_view(&self, view: &str, html: &str) {
        write(&self.dir.path().join("views").join(format!("{}.html", view)), html);
    }

    pub fn default_env(&self, env: Value) {
        write(&self.dir.path().join("defaultEnv.json"), &env.to_string());
    }

    pub fn config(&self) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "127.0.0.1:0".to_string();
        config.site.modules_dir = self.dir.path().join("modules");
        config.site.default_env = self.dir.path().join("defaultEnv.json");
        config.site.views_dir = self.dir.path().join("views");
        config.site.support_email = Some("support@example.com".to_string());
        config.users = self.users.clone();
        config
    }

    pub async fn build(&self, catalog: ModelCatalog) -> Site {
        let config = self.config();
        let users = user_directory(&config);
        build_site(config, catalog, users).await.unwrap()
    }
}

/// One module inside a [`SiteFixture`].
pub struct ModuleFixture {
    root: PathBuf,
}

impl ModuleFixture {
    pub fn view(&self, page: &str, html: &str) -> &Self {
        write(&self.root.join("views").join(format!("{}.html", page.trim_start_matches('/'))), html);
        self
    }

    pub fn static_file(&self, rel: &str, contents: &[u8]) -> &Self {
        let path = self.root.join("static").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
        self
    }

    /// Model artifact for `page`, naming a catalog kind.
    pub fn model(&self, page: &str, kind: &str) -> &Self {
        let dir = self.root.join("models").join(page.trim_start_matches('/'));
        let file = format!("{}.model", last_segment(page));
        write(&dir.join(file), &format!(r#"{{ "model": "{}" }}"#, kind));
        self
    }

    /// Per-page environment sidecar.
    pub fn sidecar(&self, page: &str, env: Value) -> &Self {
        let dir = self.root.join("models").join(page.trim_start_matches('/'));
        write(&dir.join(format!("{}.json", last_segment(page))), &env.to_string());
        self
    }

    pub fn redirects(&self, table: Value) -> &Self {
        write(&self.root.join("models").join("redirects.json"), &table.to_string());
        self
    }
}

fn last_segment(page: &str) -> &str {
    page.rsplit('/').next().unwrap_or(page)
}

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

type Produce = dyn Fn(&ModelRequest) -> ModelOutput + Send + Sync;

/// Model that counts its invocations and returns a fixed output.
#[derive(Clone)]
pub struct ProbeModel {
    calls: Arc<AtomicUsize>,
    produce: Arc<Produce>,
}

impl ProbeModel {
    pub fn new<F>(produce: F) -> Self
    where
        F: Fn(&ModelRequest) -> ModelOutput + Send + Sync + 'static,
    {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            produce: Arc::new(produce),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Register under `kind`; every artifact of that kind shares the counter.
    pub fn register(&self, catalog: &mut ModelCatalog, kind: &str) {
        let probe = self.clone();
        catalog.register(kind, move || Arc::new(probe.clone()) as Arc<dyn Model>);
    }
}

#[async_trait]
impl Model for ProbeModel {
    async fn render(&self, request: &ModelRequest) -> Result<ModelOutput, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.produce)(request))
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("host", "example.com")
        .body(Body::empty())
        .unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
