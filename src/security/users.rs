//! User lookup for permission checks.
//!
//! # Design Decisions
//! - Lookup is async and opaque; the directory may be a database, a remote
//!   service, or the static table from the server config
//! - A failed lookup is an error, never an anonymous user

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::UserConfig;

/// Capability-checkable user returned by a [`UserDirectory`].
pub trait PermissionUser: Send + Sync + Debug {
    fn id(&self) -> &str;

    /// Returns true if the user holds `permission`.
    fn has(&self, permission: &str) -> bool;
}

/// Errors from user resolution.
#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("user lookup failed: {0}")]
    Lookup(String),
}

/// Async lookup from user id to permission object.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup(&self, user_id: &str) -> Result<Arc<dyn PermissionUser>, PermissionError>;
}

/// A user from the static configuration table.
#[derive(Debug, Clone)]
pub struct StaticUser {
    id: String,
    permissions: HashSet<String>,
}

impl StaticUser {
    pub fn new(id: impl Into<String>, permissions: impl IntoIterator<Item = String>) -> Self {
        Self {
            id: id.into(),
            permissions: permissions.into_iter().collect(),
        }
    }
}

impl PermissionUser for StaticUser {
    fn id(&self) -> &str {
        &self.id
    }

    fn has(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Directory backed by the `[[users]]` table of the server config.
#[derive(Debug, Default)]
pub struct StaticUserDirectory {
    users: HashMap<String, Arc<StaticUser>>,
}

impl StaticUserDirectory {
    pub fn from_config(users: &[UserConfig]) -> Self {
        let users = users
            .iter()
            .map(|u| {
                let user = StaticUser::new(u.id.clone(), u.permissions.iter().cloned());
                (u.id.clone(), Arc::new(user))
            })
            .collect();
        Self { users }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn lookup(&self, user_id: &str) -> Result<Arc<dyn PermissionUser>, PermissionError> {
        match self.users.get(user_id) {
            Some(user) => Ok(user.clone() as Arc<dyn PermissionUser>),
            None => Err(PermissionError::UnknownUser(user_id.to_string())),
        }
    }
}

/// Directory for sites without a user backend. Every lookup fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUserDirectory;

#[async_trait]
impl UserDirectory for NoUserDirectory {
    async fn lookup(&self, user_id: &str) -> Result<Arc<dyn PermissionUser>, PermissionError> {
        Err(PermissionError::Lookup(format!(
            "no user directory configured (user {})",
            user_id
        )))
    }
}
