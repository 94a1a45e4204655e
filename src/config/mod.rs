//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! server config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → owned by the ServerContext, shared via Arc
//!
//! modules/<name>/module.json
//!     → descriptor.rs (prefix + resolved directories)
//!     → one Module per descriptor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod descriptor;
pub mod loader;
pub mod schema;
pub mod validation;

pub use descriptor::{ModuleDescriptor, ModuleDirs};
pub use loader::{load_config, load_or_default, parse_config, ConfigError};
pub use schema::ServerConfig;
pub use schema::ListenerConfig;
pub use schema::SiteConfig;
pub use schema::TimeoutConfig;
pub use schema::ObservabilityConfig;
pub use schema::UserConfig;
