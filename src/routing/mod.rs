//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     modules/<name>/module.json
//!     → discovery.rs (sorted by name, invalid descriptors skipped)
//!     → router.rs (one PageRenderer per module, registration order)
//!
//! Incoming Request (path)
//!     → router.rs (modules in order)
//!     → matcher.rs (prefix check)
//!     → PageRenderer: Handled(response) or Next
//!     → no module left → 404
//! ```
//!
//! # Design Decisions
//! - Modules registered at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always reaches the same module

pub mod discovery;
pub mod matcher;
pub mod router;

pub use discovery::discover_modules;
pub use router::ModuleRouter;
