//! View templates.
//!
//! Rendering is a black box to the page pipeline: it asks whether a view
//! exists and hands over an environment. [`JinjaTemplates`] is the built-in
//! engine; anything implementing [`TemplateEngine`] can replace it.

pub mod jinja;

use async_trait::async_trait;
use thiserror::Error;

use crate::environment::Environment;

pub use jinja::JinjaTemplates;

/// Errors from template rendering.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("view '{0}' does not exist")]
    NotFound(String),

    #[error("invalid view name '{0}'")]
    InvalidName(String),

    #[error("render failed: {0}")]
    Render(#[from] minijinja::Error),
}

/// Render-template-with-data service for one views directory.
#[async_trait]
pub trait TemplateEngine: Send + Sync {
    /// True if a template exists for the module-relative view path.
    async fn view_exists(&self, view: &str) -> bool;

    /// True if the view path names a directory of templates.
    async fn is_view_directory(&self, view: &str) -> bool;

    /// Render a view with the given environment.
    fn render(&self, view: &str, env: &Environment) -> Result<String, TemplateError>;
}
