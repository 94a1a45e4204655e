//! `minijinja`-backed template engine.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use minijinja::{path_loader, Environment as Jinja};

use crate::environment::Environment;
use crate::module::paths::join_under;
use crate::templates::{TemplateEngine, TemplateError};

/// Templates loaded from `<views>/<view>.<extension>`.
pub struct JinjaTemplates {
    views_dir: PathBuf,
    extension: String,
    /// Re-read templates from disk on every render.
    reload: bool,
    cached: Jinja<'static>,
}

impl JinjaTemplates {
    pub fn new(views_dir: impl Into<PathBuf>, extension: impl Into<String>, reload: bool) -> Self {
        let views_dir = views_dir.into();
        Self {
            cached: Self::environment(&views_dir),
            views_dir,
            extension: extension.into(),
            reload,
        }
    }

    pub fn views_dir(&self) -> &Path {
        &self.views_dir
    }

    fn environment(views_dir: &Path) -> Jinja<'static> {
        let mut env = Jinja::new();
        env.set_loader(path_loader(views_dir));
        env
    }

    fn template_name(&self, view: &str) -> Result<String, TemplateError> {
        let trimmed = view.trim_start_matches('/');
        if trimmed.is_empty() || join_under(&self.views_dir, trimmed).is_none() {
            return Err(TemplateError::InvalidName(view.to_string()));
        }
        Ok(format!("{}.{}", trimmed, self.extension))
    }

    fn file_for(&self, view: &str) -> Option<PathBuf> {
        join_under(&self.views_dir, &format!("{}.{}", view.trim_start_matches('/'), self.extension))
    }
}

#[async_trait]
impl TemplateEngine for JinjaTemplates {
    async fn view_exists(&self, view: &str) -> bool {
        match self.file_for(view) {
            Some(file) => tokio::fs::metadata(file).await.map(|m| m.is_file()).unwrap_or(false),
            None => false,
        }
    }

    async fn is_view_directory(&self, view: &str) -> bool {
        match join_under(&self.views_dir, view) {
            Some(dir) => tokio::fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false),
            None => false,
        }
    }

    fn render(&self, view: &str, env: &Environment) -> Result<String, TemplateError> {
        let name = self.template_name(view)?;
        let fresh;
        let jinja = if self.reload {
            fresh = Self::environment(&self.views_dir);
            &fresh
        } else {
            &self.cached
        };

        let template = jinja.get_template(&name).map_err(|e| match e.kind() {
            minijinja::ErrorKind::TemplateNotFound => TemplateError::NotFound(view.to_string()),
            _ => TemplateError::Render(e),
        })?;
        Ok(template.render(env)?)
    }
}
