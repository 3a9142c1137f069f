//! SQLCipher-backed token record repository.
//!
//! Implements the `TokenStore` port: one row per user, upserted in place,
//! deleted outright when the token becomes unusable. All database work runs
//! in `spawn_blocking`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use roamly_core::design_export::ports::TokenStore;
use roamly_domain::{Result, TokenRecord};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;

use super::manager::{map_join_error, map_sql_error, DbConnection, DbManager};

/// SQLCipher-backed store for per-user token records.
pub struct SqliteTokenRepository {
    db: Arc<DbManager>,
}

impl SqliteTokenRepository {
    /// Create a new repository with the given database manager.
    #[must_use]
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    async fn with_connection<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DbConnection) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<T> {
            let conn = db.get_connection()?;
            op(&conn)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl TokenStore for SqliteTokenRepository {
    async fn get(&self, user_id: &str) -> Result<Option<TokenRecord>> {
        let user_id = user_id.to_string();
        self.with_connection(move |conn| query_record(conn, &user_id)).await
    }

    async fn upsert(&self, record: &TokenRecord) -> Result<()> {
        let record = record.clone();
        self.with_connection(move |conn| upsert_record(conn, &record)).await
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        let user_id = user_id.to_string();
        self.with_connection(move |conn| delete_record(conn, &user_id)).await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn query_record(conn: &DbConnection, user_id: &str) -> Result<Option<TokenRecord>> {
    conn.query_row(
        "SELECT user_id, access_token, refresh_token, expires_at
         FROM token_records WHERE user_id = ?1",
        params![user_id],
        row_to_record,
    )
    .optional()
    .map_err(map_sql_error)
}

fn upsert_record(conn: &DbConnection, record: &TokenRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO token_records (user_id, access_token, refresh_token, expires_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, CAST(strftime('%s','now') AS INTEGER))
         ON CONFLICT(user_id) DO UPDATE SET
            access_token = excluded.access_token,
            refresh_token = excluded.refresh_token,
            expires_at = excluded.expires_at,
            updated_at = excluded.updated_at",
        params![
            record.user_id,
            record.access_token,
            record.refresh_token,
            record.expires_at.timestamp(),
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

fn delete_record(conn: &DbConnection, user_id: &str) -> Result<()> {
    conn.execute("DELETE FROM token_records WHERE user_id = ?1", params![user_id])
        .map_err(map_sql_error)?;
    Ok(())
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<TokenRecord> {
    let expires_at: i64 = row.get(3)?;
    Ok(TokenRecord {
        user_id: row.get(0)?,
        access_token: row.get(1)?,
        refresh_token: row.get(2)?,
        expires_at: Utc.timestamp_opt(expires_at, 0).single().unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::TempDir;

    use super::*;

    const TEST_KEY: &str = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    async fn setup() -> (SqliteTokenRepository, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("tokens.db");

        let mgr = Arc::new(DbManager::new(&db_path, 4, Some(TEST_KEY)).expect("manager created"));
        mgr.run_migrations().expect("migrations run");

        (SqliteTokenRepository::new(mgr), temp_dir)
    }

    fn record(user_id: &str, access_token: &str) -> TokenRecord {
        TokenRecord {
            user_id: user_id.to_string(),
            access_token: access_token.to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn get_missing_record_returns_none() {
        let (repo, _dir) = setup().await;
        assert!(repo.get("nobody").await.expect("query ok").is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upsert_overwrites_in_place() {
        let (repo, _dir) = setup().await;

        repo.upsert(&record("user-1", "first")).await.expect("insert ok");
        repo.upsert(&record("user-1", "second")).await.expect("update ok");

        let stored = repo.get("user-1").await.expect("query ok").expect("row present");
        assert_eq!(stored.access_token, "second");
        assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn null_refresh_token_round_trips() {
        let (repo, _dir) = setup().await;

        let mut row = record("user-1", "access");
        row.refresh_token = None;
        repo.upsert(&row).await.expect("insert ok");

        let stored = repo.get("user-1").await.expect("query ok").expect("row present");
        assert!(stored.refresh_token.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_is_idempotent() {
        let (repo, _dir) = setup().await;

        repo.upsert(&record("user-1", "access")).await.expect("insert ok");
        repo.delete("user-1").await.expect("delete ok");
        assert!(repo.get("user-1").await.expect("query ok").is_none());

        // Deleting a missing record is not an error.
        repo.delete("user-1").await.expect("second delete ok");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn expiry_round_trips_to_second_precision() {
        let (repo, _dir) = setup().await;

        let row = record("user-1", "access");
        repo.upsert(&row).await.expect("insert ok");

        let stored = repo.get("user-1").await.expect("query ok").expect("row present");
        assert_eq!(stored.expires_at.timestamp(), row.expires_at.timestamp());
    }
}
