//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, buffered body, origin)
//!     → routing (module dispatch)
//!     → response.rs (redirects, error pages)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{IncomingRequest, MakeRequestUuid, Origin, X_REQUEST_ID};
pub use response::ErrorPages;
pub use server::SiteServer;
