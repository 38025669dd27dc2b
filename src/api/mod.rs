//! HTTP API.
//!
//! `api_router()` returns a self-contained `Router` with CORS and request
//! tracing; `start_api_server()` binds it and runs it in the background.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer, ServerError};
pub use types::ApiContext;
