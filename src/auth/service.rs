//! Authorization decision service.
//!
//! Sits between the API handlers and the two things that can answer an
//! authorization question: the durable store of confirmed fingerprints and
//! the upstream login probe. A stored fingerprint short-circuits the probe
//! entirely, which is the whole point of the store — confirmed credentials
//! cost one upstream round-trip ever, not one per request.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::auth::fingerprint::{fingerprint, Cookie};
use crate::auth::store::{AuthorizationStore, StoreError};
use crate::scraper::{ScrapeClient, ScrapeError};

/// Errors from an authorization decision.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The credentials are missing or the upstream rejected them. Always a
    /// caller problem, never an infrastructure fault.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The authorization store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The upstream probe failed for a reason other than bad credentials.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

/// Result of an explicit authorization request.
///
/// Absent flags are omitted from the wire shape: a fresh confirmation
/// answers `{id, added: true}`, a cache hit `{id, exists: true, added:
/// false}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthOutcome {
    /// Fingerprint the decision was recorded under.
    pub id: String,
    /// `true` when the fingerprint was already confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    /// Whether this call created the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<bool>,
}

/// Result of an explicit deauthorization request.
///
/// Removing an absent fingerprint answers `{id}` alone; a real removal
/// answers `{id, exists: true, removed: true}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeauthOutcome {
    /// Fingerprint the removal was keyed on.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
}

/// The authorization decision service.
pub struct AuthService {
    store: AuthorizationStore,
    client: Arc<dyn ScrapeClient>,
}

impl AuthService {
    /// Creates the service over a store and an upstream client.
    pub fn new(store: AuthorizationStore, client: Arc<dyn ScrapeClient>) -> Self {
        Self { store, client }
    }

    /// Decides whether the cookie set is authorized, confirming it upstream
    /// on first sight.
    ///
    /// An empty cookie set is rejected before the store or the upstream is
    /// touched. A fingerprint already in the store is authorized without an
    /// upstream call. Otherwise the upstream login probe runs once; success
    /// records the fingerprint, failure rejects.
    ///
    /// Returns the fingerprint the decision was keyed on.
    ///
    /// # Errors
    ///
    /// `AuthError::Unauthorized` for missing or rejected credentials;
    /// `Store`/`Scrape` for infrastructure faults, which must never be
    /// reported as an authorization verdict.
    #[instrument(skip(self, cookies), fields(cookies = cookies.len()))]
    pub async fn ensure_authorized(&self, cookies: &[Cookie]) -> Result<String, AuthError> {
        if cookies.is_empty() {
            return Err(AuthError::Unauthorized("no cookies provided".to_string()));
        }

        let id = fingerprint(cookies);
        if self.store.contains(&id).await? {
            debug!(%id, "authorization cache hit");
            return Ok(id);
        }

        if !self.probe_login(cookies).await? {
            return Err(AuthError::Unauthorized(
                "cookies do not represent a login session".to_string(),
            ));
        }

        self.store.insert(&id).await?;
        info!(%id, "confirmed new authorization");
        Ok(id)
    }

    /// Explicitly authorizes a cookie set, reporting whether a new record
    /// was created.
    ///
    /// Same decision path as [`ensure_authorized`](Self::ensure_authorized);
    /// a cache hit answers `added: false` without touching the upstream.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`ensure_authorized`](Self::ensure_authorized).
    #[instrument(skip(self, cookies), fields(cookies = cookies.len()))]
    pub async fn add(&self, cookies: &[Cookie]) -> Result<AuthOutcome, AuthError> {
        if cookies.is_empty() {
            return Err(AuthError::Unauthorized("no cookies provided".to_string()));
        }

        let id = fingerprint(cookies);
        if self.store.contains(&id).await? {
            debug!(%id, "fingerprint already authorized");
            return Ok(AuthOutcome {
                id,
                exists: Some(true),
                added: Some(false),
            });
        }

        if !self.probe_login(cookies).await? {
            return Err(AuthError::Unauthorized(
                "cookies do not represent a login session".to_string(),
            ));
        }

        self.store.insert(&id).await?;
        info!(%id, "confirmed new authorization");
        Ok(AuthOutcome {
            id,
            exists: None,
            added: Some(true),
        })
    }

    /// Removes the authorization record for a cookie set.
    ///
    /// Never touches the upstream; removing an absent fingerprint is a
    /// reported no-op, not an error.
    ///
    /// # Errors
    ///
    /// `AuthError::Unauthorized` for an empty cookie set, `Store` on
    /// database failure.
    #[instrument(skip(self, cookies), fields(cookies = cookies.len()))]
    pub async fn remove(&self, cookies: &[Cookie]) -> Result<DeauthOutcome, AuthError> {
        if cookies.is_empty() {
            return Err(AuthError::Unauthorized("no cookies provided".to_string()));
        }

        let id = fingerprint(cookies);
        if !self.store.remove(&id).await? {
            return Ok(DeauthOutcome {
                id,
                exists: None,
                removed: None,
            });
        }
        info!(%id, "removed authorization");
        Ok(DeauthOutcome {
            id,
            exists: Some(true),
            removed: Some(true),
        })
    }

    /// Runs the upstream login probe. A notice page is already folded into
    /// `Ok(false)` by the client.
    async fn probe_login(&self, cookies: &[Cookie]) -> Result<bool, ScrapeError> {
        self.client.check_login(cookies).await
    }
}
