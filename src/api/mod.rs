//! HTTP API for the dashboard frontend.
//!
//! `router` wires the endpoints, `server` owns the listener lifecycle,
//! `error` maps failures to structured JSON bodies, and `types` carries
//! the shared request context.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_server, ApiServer};
pub use types::ApiContext;
