//! Page access gate.
//!
//! Evaluated after the page environment is composed and before any model
//! runs, so a denied request never reaches model code.
//!
//! # Checks (in order)
//! 1. `requiresLogin` without a session user → redirect to the login path
//! 2. `allowedPositions` with no overlap in the session's positions → 403
//! 3. `usePermissions` or non-empty `permissions` with a session user →
//!    resolve the user (failure → 500), every listed permission must be
//!    held (first missing one → 403), then attach the user to the session

use std::sync::Arc;

use crate::environment::{self, keys, Environment};
use crate::security::session::Session;
use crate::security::users::UserDirectory;

/// Outcome of the gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// Redirect to the contained login path.
    Login(String),
    Forbidden,
    /// User resolution failed.
    Internal,
}

/// Login, position and capability checks for pages.
#[derive(Clone)]
pub struct PermissionGate {
    users: Arc<dyn UserDirectory>,
    login_path: String,
}

impl PermissionGate {
    pub fn new(users: Arc<dyn UserDirectory>, login_path: impl Into<String>) -> Self {
        Self {
            users,
            login_path: login_path.into(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Run every check the environment asks for.
    pub async fn check(&self, env: &Environment, session: &Session, page: &str) -> GateDecision {
        let user_id = session.user_id();

        if environment::flag(env, keys::REQUIRES_LOGIN) && user_id.is_none() {
            tracing::debug!(path = %page, "Login required, redirecting");
            return GateDecision::Login(self.login_path.clone());
        }

        if env.contains_key(keys::ALLOWED_POSITIONS) {
            let allowed = environment::string_list(env, keys::ALLOWED_POSITIONS);
            let held = session.positions();
            if !held.iter().any(|p| allowed.contains(p)) {
                tracing::warn!(
                    user = user_id.as_deref().unwrap_or("anonymous"),
                    path = %page,
                    "User holds none of the allowed positions"
                );
                return GateDecision::Forbidden;
            }
        }

        let required = environment::string_list(env, keys::PERMISSIONS);
        let wants_permissions = environment::flag(env, keys::USE_PERMISSIONS) || !required.is_empty();
        let Some(user_id) = user_id.filter(|_| wants_permissions) else {
            return GateDecision::Allow;
        };

        let user = match self.users.lookup(&user_id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(user = %user_id, error = %e, "Permission lookup failed");
                return GateDecision::Internal;
            }
        };

        for permission in &required {
            if !user.has(permission) {
                tracing::warn!(
                    user = %user_id,
                    permission = %permission,
                    path = %page,
                    "User does not have permission"
                );
                return GateDecision::Forbidden;
            }
        }

        session.set_permissions(user);
        GateDecision::Allow
    }
}
