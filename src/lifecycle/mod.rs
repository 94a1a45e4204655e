//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! startup.rs:
//!     ServerConfig → ServerContext → modules/<name>/module.json → Module
//!         → ModelRegistry::load_all → ModelWatcher (dev only) → SiteServer
//!
//! signals.rs:
//!     SIGINT / SIGTERM → Shutdown::trigger
//!
//! shutdown.rs:
//!     trigger → SiteServer stops accepting → in-flight requests finish
//! ```
//!
//! # Design Decisions
//! - The listener is bound before modules load so port errors surface first
//! - No reload on SIGHUP; dev mode reloads models and views from disk instead

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_site, user_directory, Site, StartupError};
