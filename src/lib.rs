//! HTTP gateway over a gallery-site scraping backend.
//!
//! The gateway exposes a stable JSON API for submissions, journals, users
//! and paginated folder listings. Callers supply session cookies in request
//! bodies; confirmed cookie sets are remembered by fingerprint in a local
//! database so the upstream login probe runs once per credential set, not
//! once per request. Upstream calls are paced per caller and honor the
//! site's robots policy.
//!
//! Module map:
//! - [`api`] — routing, the versioned public schema, the error surface
//! - [`auth`] — credential fingerprinting, the durable authorization store,
//!   the decision service
//! - [`scraper`] — the upstream client seam and its reqwest implementation
//! - [`pacing`] — per-source minimum-interval pacing
//! - [`db`] — SQLite plumbing

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod api;
pub mod auth;
pub mod db;
pub mod pacing;
pub mod scraper;

pub use db::Database;
