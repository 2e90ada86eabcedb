//! Failure taxonomy of the upstream scraping client.
//!
//! Every fetch against the upstream site resolves into one of these variants.
//! The set is closed on purpose: the API layer maps it onto the outward error
//! kinds and anything the adapter cannot classify stays a `Network` fault,
//! which surfaces as an uncategorized server error (never a 2xx).

use thiserror::Error;

/// Errors raised by the upstream scraping client.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The upstream rendered a notice page instead of the requested content.
    /// This is the site's login/authentication-required signal.
    #[error("upstream notice page: {0}")]
    Notice(String),

    /// The requested path is disallowed by the site's robots policy.
    #[error("path disallowed by robots policy: {0}")]
    Disallowed(String),

    /// The resource is absent upstream or the upstream answered with a
    /// server-side error status.
    #[error("upstream error for {path}: HTTP {status}")]
    Server {
        /// Requested upstream path.
        path: String,
        /// Upstream HTTP status.
        status: u16,
    },

    /// The page fetched fine but its structure did not match expectations
    /// (missing title block, unexpected empty page, ...).
    #[error("failed to parse page: {0}")]
    Parsing(String),

    /// Transport-level failure talking to the upstream.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ScrapeError {
    /// Creates a notice-page error.
    pub fn notice(detail: impl Into<String>) -> Self {
        Self::Notice(detail.into())
    }

    /// Creates a robots-disallowed error for the path.
    pub fn disallowed(path: impl Into<String>) -> Self {
        Self::Disallowed(path.into())
    }

    /// Creates an upstream server/absence error.
    pub fn server(path: impl Into<String>, status: u16) -> Self {
        Self::Server {
            path: path.into(),
            status,
        }
    }

    /// Creates a structural parse error.
    pub fn parsing(detail: impl Into<String>) -> Self {
        Self::Parsing(detail.into())
    }
}
