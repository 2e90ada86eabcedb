//! Credential identity and authorization.
//!
//! Cookies are never persisted or logged; everything downstream of the
//! request body works with their [`fingerprint`] instead. The durable
//! [`store`] holds confirmed fingerprints under a capacity bound, and the
//! [`service`] makes the actual authorization decisions.

pub mod fingerprint;
pub mod service;
pub mod store;

pub use fingerprint::{fingerprint, Cookie};
pub use service::{AuthError, AuthOutcome, AuthService, DeauthOutcome};
pub use store::{AuthorizationStore, StoreError, DEFAULT_DATABASE_LIMIT};
