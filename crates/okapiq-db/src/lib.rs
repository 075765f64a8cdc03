//! SQLite persistence for Okapiq.
//!
//! The database is optional at runtime: without a configured URL the server
//! simply skips scan-history recording. Everything here is keyed off one
//! `scan_history` table.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

pub mod scan_history;

pub use scan_history::{insert_scan, recent_scans, scan_count, NewScanRecord, ScanHistoryRow};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/okapiq-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Error)]
pub enum DbError {
    #[error("invalid database url: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("failed to serialize scan result: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Connects to SQLite at `database_url`, creating the file if missing, and
/// applies pending migrations.
///
/// # Errors
///
/// Returns [`DbError`] if the URL is invalid, the connection fails, or a
/// migration fails.
pub async fn connect(database_url: &str) -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| DbError::InvalidUrl(e.to_string()))?
        .create_if_missing(true);

    // An in-memory SQLite database exists per connection, so the pool must
    // not open a second one or the migrated schema disappears.
    let max_connections = if database_url.contains(":memory:") {
        1
    } else {
        DEFAULT_MAX_CONNECTIONS
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS))
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;
    Ok(pool)
}

/// Cheap connectivity probe for the health endpoint.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn health_check(pool: &SqlitePool) -> Result<(), DbError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_and_migrate_in_memory() {
        let pool = connect("sqlite::memory:").await.expect("connect");
        health_check(&pool).await.expect("healthy");
    }
}
