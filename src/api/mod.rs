//! HTTP API.
//!
//! A thin JSON surface over `CdsService`. Routes are nested under `/api/`;
//! every response is wrapped in a `{ success, data | error }` envelope.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_api_server, ApiServer, ApiSession};
pub use types::ApiContext;
