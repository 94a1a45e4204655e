//! Per-request session state.
//!
//! The session store itself is external. Whatever middleware owns it inserts
//! a [`Session`] into the request extensions; requests without one are
//! served as anonymous with a throwaway session.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::http::Extensions;

use crate::security::users::PermissionUser;

/// Session data read and written by the page pipeline.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Authenticated user id, if logged in.
    pub user_id: Option<String>,
    /// Role/position tags held by the user.
    pub positions: Vec<String>,
    /// Last page visited, used to return after login.
    pub return_to: Option<String>,
    /// Permission object resolved by the gate.
    pub permissions: Option<Arc<dyn PermissionUser>>,
}

/// Shared handle to a request's session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    pub fn new(state: SessionState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Session for a user with the given positions.
    pub fn for_user(user_id: impl Into<String>, positions: Vec<String>) -> Self {
        Self::new(SessionState {
            user_id: Some(user_id.into()),
            positions,
            ..SessionState::default()
        })
    }

    /// Take the session from request extensions, or start an anonymous one.
    pub fn from_extensions(extensions: &Extensions) -> Self {
        extensions.get::<Session>().cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // A poisoned session only means another holder panicked mid-update.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn user_id(&self) -> Option<String> {
        self.lock().user_id.clone()
    }

    pub fn positions(&self) -> Vec<String> {
        self.lock().positions.clone()
    }

    pub fn return_to(&self) -> Option<String> {
        self.lock().return_to.clone()
    }

    pub fn set_return_to(&self, path: impl Into<String>) {
        self.lock().return_to = Some(path.into());
    }

    pub fn permissions(&self) -> Option<Arc<dyn PermissionUser>> {
        self.lock().permissions.clone()
    }

    pub fn set_permissions(&self, user: Arc<dyn PermissionUser>) {
        self.lock().permissions = Some(user);
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }
}
