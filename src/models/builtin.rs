//! Model kinds shipped with the server.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::environment::Environment;
use crate::models::{Model, ModelCatalog, ModelError, ModelOutput, ModelRequest};

/// Register every built-in kind.
pub fn register(catalog: &mut ModelCatalog) {
    catalog.register("echo", || Arc::new(EchoModel) as Arc<dyn Model>);
}

/// Echoes the request's query and form fields under `request`.
///
/// Useful as a placeholder for pages and viewless endpoints under
/// development; on `/post/` paths the fields come back as JSON text.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoModel;

#[async_trait]
impl Model for EchoModel {
    async fn render(&self, request: &ModelRequest) -> Result<ModelOutput, ModelError> {
        let fields = json!({
            "method": request.method.as_str(),
            "path": request.path,
            "query": request.query(),
            "form": request.form(),
        });

        if request.path.starts_with("/post/") {
            let text = serde_json::to_string(&fields).map_err(|e| ModelError::Failed(e.to_string()))?;
            return Ok(ModelOutput::text(text));
        }

        let mut env = Environment::new();
        env.insert("request".into(), fields);
        Ok(ModelOutput::env(env))
    }
}
