//! SQLCipher-backed authorization state repository.
//!
//! Implements the `AuthStateStore` port. Consumption uses a single
//! `DELETE ... RETURNING` statement so a replayed callback can never observe
//! the same state row twice. All database work runs in `spawn_blocking`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use roamly_core::design_export::ports::AuthStateStore;
use roamly_domain::{AuthorizationState, ExportError, Result};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;

use super::manager::{map_join_error, map_sql_error, DbConnection, DbManager};

/// SQLCipher-backed store for pending authorization states.
pub struct SqliteAuthStateRepository {
    db: Arc<DbManager>,
}

impl SqliteAuthStateRepository {
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
impl AuthStateStore for SqliteAuthStateRepository {
    async fn put(&self, state: &AuthorizationState) -> Result<()> {
        let state = state.clone();
        self.with_connection(move |conn| insert_state(conn, &state)).await
    }

    async fn take(&self, state: &str) -> Result<Option<AuthorizationState>> {
        let state = state.to_string();
        self.with_connection(move |conn| take_state(conn, &state)).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_connection(move |conn| purge_expired_states(conn, now)).await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn insert_state(conn: &DbConnection, state: &AuthorizationState) -> Result<()> {
    conn.execute(
        "INSERT INTO authorization_states
            (state, uid, diary_id, code_verifier, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            state.state,
            state.uid,
            state.diary_id,
            state.code_verifier,
            state.created_at.timestamp(),
            state.expires_at.timestamp(),
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

/// Atomic consume: delete-if-exists returning the deleted row.
fn take_state(conn: &DbConnection, state: &str) -> Result<Option<AuthorizationState>> {
    conn.query_row(
        "DELETE FROM authorization_states
         WHERE state = ?1
         RETURNING state, uid, diary_id, code_verifier, created_at, expires_at",
        params![state],
        row_to_state,
    )
    .optional()
    .map_err(map_sql_error)
}

fn purge_expired_states(conn: &DbConnection, now: DateTime<Utc>) -> Result<usize> {
    conn.execute(
        "DELETE FROM authorization_states WHERE expires_at <= ?1",
        params![now.timestamp()],
    )
    .map_err(map_sql_error)
}

fn row_to_state(row: &Row<'_>) -> rusqlite::Result<AuthorizationState> {
    Ok(AuthorizationState {
        state: row.get(0)?,
        uid: row.get(1)?,
        diary_id: row.get(2)?,
        code_verifier: row.get(3)?,
        created_at: timestamp_to_datetime(row.get(4)?),
        expires_at: timestamp_to_datetime(row.get(5)?),
    })
}

fn timestamp_to_datetime(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}
