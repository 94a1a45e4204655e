//! Multi-module web application server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ routing::ModuleRouter
//!                                          │ (registration order)
//!                                          ▼
//!                                   module::PageRenderer
//!                     ┌──────────────┬─────┴──────┬──────────────┐
//!                     ▼              ▼            ▼              ▼
//!                static files    redirects   environment    security
//!                                              composer    (permission gate)
//!                                                 │
//!                                                 ▼
//!                                     models (fan-out / fan-in)
//!                                                 │
//!                                                 ▼
//!                                         templates (views)
//!     ◀───────────────────────────────────────────┘
//!     Client Response
//! ```
//!
//! Cross-cutting: `config`, `lifecycle`, `observability`.

// Core subsystems
pub mod config;
pub mod context;
pub mod http;
pub mod module;
pub mod routing;

// Page pipeline
pub mod environment;
pub mod models;
pub mod templates;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ServerConfig;
pub use context::ServerContext;
pub use http::SiteServer;
pub use lifecycle::Shutdown;
