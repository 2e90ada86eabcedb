//! Outward error surface.
//!
//! Every failure leaving a handler is normalized into one of five kinds with
//! a fixed status code and a `{"detail": ...}` JSON body. The mapping from
//! the scraping client's taxonomy is total: an unclassifiable fault becomes
//! `Internal`, never a 2xx with an error payload.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::{AuthError, StoreError};
use crate::scraper::ScrapeError;

/// The five outward error kinds.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or rejected credentials (401).
    #[error("{0}")]
    Unauthorized(String),

    /// The requested path is disallowed by the upstream's crawl policy (403).
    #[error("path disallowed by upstream policy: {0}")]
    DisallowedPath(String),

    /// The resource does not exist upstream (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The upstream page could not be interpreted (500).
    #[error("failed to parse upstream page: {0}")]
    Parsing(String),

    /// Anything else (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The HTTP status this kind maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::DisallowedPath(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Parsing(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        match err {
            // A notice page is the upstream's login-required signal
            ScrapeError::Notice(detail) => Self::Unauthorized(detail),
            ScrapeError::Disallowed(path) => Self::DisallowedPath(path),
            ScrapeError::Server { path, status } => {
                Self::NotFound(format!("{path} (upstream status {status})"))
            }
            ScrapeError::Parsing(detail) => Self::Parsing(detail),
            ScrapeError::Network(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized(detail) => Self::Unauthorized(detail),
            AuthError::Store(e) => e.into(),
            AuthError::Scrape(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, detail = %self, "request failed");
        } else {
            warn!(%status, detail = %self, "request rejected");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
