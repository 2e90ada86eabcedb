//! Durable store of confirmed-valid credential fingerprints.
//!
//! One row per cookie set that passed the upstream login probe. Rows are
//! written once and never updated; they disappear through explicit
//! deauthorization or oldest-first eviction once the capacity bound is
//! exceeded. The store is the only durable shared resource in the process.

use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::FromRow;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::db::Database;

/// Default capacity bound for retained authorization records.
pub const DEFAULT_DATABASE_LIMIT: i64 = 10_000;

/// Store-level errors. These are infrastructure faults, not authorization
/// decisions — callers must propagate them, never translate them to 401.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("authorization store query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// A confirmed authorization row.
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct AuthorizationRecord {
    /// Fingerprint of the confirmed cookie set (40 hex chars).
    pub fingerprint: String,
    /// Float unix timestamp of when the confirmation happened.
    pub added_at: f64,
}

/// Capacity-bounded key-value store of authorization records.
///
/// Cloneable handle over the shared connection pool; single-statement
/// operations are atomic, the count-then-evict sequence is not serialized
/// against concurrent inserts (temporary overshoot of the bound is accepted).
#[derive(Debug, Clone)]
pub struct AuthorizationStore {
    db: Database,
    limit: i64,
}

impl AuthorizationStore {
    /// Creates a store over an open database with the given capacity bound.
    #[must_use]
    pub fn new(db: Database, limit: i64) -> Self {
        Self { db, limit }
    }

    /// Returns the configured capacity bound.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Returns whether a record exists for the fingerprint.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Query` on database failure.
    #[instrument(skip(self))]
    pub async fn contains(&self, fingerprint: &str) -> Result<bool, StoreError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM authorizations WHERE fingerprint = ?1")
                .bind(fingerprint)
                .fetch_optional(self.db.pool())
                .await?;
        Ok(row.is_some())
    }

    /// Inserts a record for the fingerprint at the current time, then evicts
    /// oldest records until the capacity bound holds.
    ///
    /// Inserting an already-present fingerprint is a no-op (records are never
    /// updated).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Query` on database failure.
    #[instrument(skip(self))]
    pub async fn insert(&self, fingerprint: &str) -> Result<(), StoreError> {
        self.insert_at(fingerprint, unix_now()).await
    }

    /// Inserts a record with an explicit timestamp. Exposed for callers that
    /// need deterministic `added_at` ordering (tests, backfills).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Query` on database failure.
    pub async fn insert_at(&self, fingerprint: &str, added_at: f64) -> Result<(), StoreError> {
        sqlx::query("INSERT OR IGNORE INTO authorizations (fingerprint, added_at) VALUES (?1, ?2)")
            .bind(fingerprint)
            .bind(added_at)
            .execute(self.db.pool())
            .await?;

        let evicted = self.evict_to_limit().await?;
        if evicted > 0 {
            debug!(evicted, limit = self.limit, "evicted oldest authorization records");
        }
        Ok(())
    }

    /// Deletes the record for the fingerprint.
    ///
    /// Returns whether a record existed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Query` on database failure.
    #[instrument(skip(self))]
    pub async fn remove(&self, fingerprint: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM authorizations WHERE fingerprint = ?1")
            .bind(fingerprint)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns the number of stored records.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Query` on database failure.
    pub async fn count(&self) -> Result<i64, StoreError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM authorizations")
            .fetch_one(self.db.pool())
            .await?;
        Ok(row.0)
    }

    /// Deletes oldest-by-`added_at` records until at most `limit` remain.
    ///
    /// Single statement: keep the newest `limit` rows, drop the rest. Returns
    /// the number of evicted records.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Query` on database failure.
    pub async fn evict_to_limit(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM authorizations WHERE fingerprint NOT IN \
             (SELECT fingerprint FROM authorizations ORDER BY added_at DESC LIMIT ?1)",
        )
        .bind(self.limit)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected())
    }

    /// Returns up to `n` records, oldest first. Introspection helper.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Query` on database failure.
    pub async fn oldest(&self, n: i64) -> Result<Vec<AuthorizationRecord>, StoreError> {
        let records = sqlx::query_as(
            "SELECT fingerprint, added_at FROM authorizations ORDER BY added_at ASC LIMIT ?1",
        )
        .bind(n)
        .fetch_all(self.db.pool())
        .await?;
        Ok(records)
    }
}

/// Current time as a float unix timestamp, matching the persisted layout.
fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
