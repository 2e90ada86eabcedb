//! SQLite persistence for the gateway.
//!
//! One pool per process, WAL journaling for concurrent readers, migrations
//! embedded at compile time. The only state furgate persists is the
//! authorization table; scraped content is never stored.
//!
//! ```no_run
//! use furgate::Database;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(Path::new("furgate.db")).await?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::instrument;

/// Pool size. Kept small; SQLite locks at the file level anyway.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How long a connection waits on a lock before returning SQLITE_BUSY.
const BUSY_TIMEOUT_MS: u32 = 5000;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("failed to connect to database: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("failed to run migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Handle to the authorization database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the database at `db_path`, creating the file if absent,
    /// switching it to WAL journaling and applying pending migrations.
    #[instrument(skip(db_path), fields(path = %db_path.display()))]
    pub async fn new(db_path: &Path) -> Result<Self, DbError> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect(&db_url)
            .await?;

        // Enable WAL mode for concurrent reads
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;

        // Set busy timeout to avoid immediate lock errors
        sqlx::query(&format!("PRAGMA busy_timeout={BUSY_TIMEOUT_MS}"))
            .execute(&pool)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Opens a private in-memory database with migrations applied, for
    /// tests. Single connection, because every sqlite `:memory:` connection
    /// is its own database.
    #[instrument]
    pub async fn new_in_memory() -> Result<Self, DbError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// The underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the pool; in-flight queries finish first.
    #[instrument(skip(self))]
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_new_in_memory_succeeds() {
        let db = Database::new_in_memory().await;
        assert!(db.is_ok(), "Failed to create in-memory database");
    }

    #[tokio::test]
    async fn test_database_migrations_create_authorizations_table() {
        let db = Database::new_in_memory().await.unwrap();

        let result = sqlx::query(
            "INSERT INTO authorizations (fingerprint, added_at) VALUES ('da39a3ee5e6b4b0d3255bfef95601890afd80709', 1700000000.0)",
        )
        .execute(db.pool())
        .await;

        assert!(
            result.is_ok(),
            "Authorizations table should exist after migration"
        );
    }

    #[tokio::test]
    async fn test_database_fingerprint_length_constraint() {
        let db = Database::new_in_memory().await.unwrap();

        // Fingerprints are fixed-length hex digests; anything else is rejected
        let result =
            sqlx::query("INSERT INTO authorizations (fingerprint, added_at) VALUES ('short', 1.0)")
                .execute(db.pool())
                .await;

        assert!(
            result.is_err(),
            "Non-40-char fingerprint should be rejected by CHECK constraint"
        );
    }

    #[tokio::test]
    async fn test_database_fingerprint_primary_key_rejects_duplicates() {
        let db = Database::new_in_memory().await.unwrap();
        let fp = "10cf73d13b980e22c78ecdc13f556962f871d697";

        sqlx::query("INSERT INTO authorizations (fingerprint, added_at) VALUES (?1, 1.0)")
            .bind(fp)
            .execute(db.pool())
            .await
            .unwrap();

        let result =
            sqlx::query("INSERT INTO authorizations (fingerprint, added_at) VALUES (?1, 2.0)")
                .bind(fp)
                .execute(db.pool())
                .await;

        assert!(result.is_err(), "Duplicate fingerprint should be rejected");
    }

    #[tokio::test]
    async fn test_database_with_tempfile_enables_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db = Database::new(&db_path).await.unwrap();

        let mode: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(
            mode.0.to_lowercase(),
            "wal",
            "WAL mode should be enabled for file-based database"
        );
    }

    #[tokio::test]
    async fn test_database_close_works() {
        let db = Database::new_in_memory().await.unwrap();
        db.close().await;
        // If we get here without panic, close worked
    }
}
