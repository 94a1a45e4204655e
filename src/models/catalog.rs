//! Constructors for model kinds.
//!
//! Artifacts on disk name a kind; the embedding application registers one
//! no-argument constructor per kind before modules are loaded.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::models::Model;

type Constructor = Arc<dyn Fn() -> Arc<dyn Model> + Send + Sync>;

/// Registry of model kinds by name.
#[derive(Clone, Default)]
pub struct ModelCatalog {
    constructors: HashMap<String, Constructor>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in kinds already registered.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        crate::models::builtin::register(&mut catalog);
        catalog
    }

    /// Register (or replace) the constructor for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn Model> + Send + Sync + 'static,
    {
        let kind = kind.into();
        if self.constructors.insert(kind.clone(), Arc::new(constructor)).is_some() {
            tracing::debug!(kind = %kind, "Model kind re-registered");
        }
        self
    }

    /// Build a fresh instance of `kind`.
    pub fn instantiate(&self, kind: &str) -> Option<Arc<dyn Model>> {
        self.constructors.get(kind).map(|ctor| ctor())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl fmt::Debug for ModelCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCatalog").field("kinds", &self.kinds()).finish()
    }
}
