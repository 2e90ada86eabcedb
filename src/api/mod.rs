//! Outward HTTP API: routing, the versioned public schema, and the error
//! surface.

pub mod error;
pub mod routes;
pub mod schema;

pub use error::ApiError;
pub use routes::{router, AppState};
