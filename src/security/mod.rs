//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Page request (after environment composition):
//!     → session.rs (per-request user, positions, return-to)
//!     → users.rs (resolve user, check permission names)
//!     → permissions.rs (login / permission / position gate)
//!     → Models run only on Allow
//! ```
//!
//! # Design Decisions
//! - Fail closed: a lookup failure is a 500, never a pass
//! - The gate runs strictly before any model

pub mod permissions;
pub mod session;
pub mod users;

pub use permissions::{GateDecision, PermissionGate};
pub use session::Session;
pub use users::{PermissionUser, UserDirectory};
