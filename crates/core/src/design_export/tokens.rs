//! Token lifecycle controller
//!
//! The single source of truth for whether a user's platform connection is
//! usable. Exchanges authorization codes, refreshes expiring tokens behind a
//! per-user lock, and deletes unusable records so the system never keeps a
//! token it cannot trust.

use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use roamly_domain::{
    ConnectionStatus, ExportError, Result, StateRejection, TokenRecord,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::ports::{AuthStateStore, DesignPlatformApi, TokenStore};
use super::service::CompletedAuthorization;

/// Owns token exchange, refresh, and invalidation for all users.
pub struct TokenLifecycle {
    states: Arc<dyn AuthStateStore>,
    tokens: Arc<dyn TokenStore>,
    platform: Arc<dyn DesignPlatformApi>,
    /// Per-user refresh locks. Single-flight: concurrent callers for one
    /// user serialize here, and the losers reuse the winner's result.
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TokenLifecycle {
    /// Create a lifecycle controller over the given stores and platform.
    #[must_use]
    pub fn new(
        states: Arc<dyn AuthStateStore>,
        tokens: Arc<dyn TokenStore>,
        platform: Arc<dyn DesignPlatformApi>,
    ) -> Self {
        Self { states, tokens, platform, refresh_locks: DashMap::new() }
    }

    /// Complete an authorization callback.
    ///
    /// The state row is consumed atomically before anything else, so it is
    /// gone whether or not the exchange succeeds and a replayed callback
    /// always fails with [`ExportError::StateInvalidOrExpired`].
    ///
    /// # Errors
    /// - [`ExportError::StateInvalidOrExpired`] when the state is unknown,
    ///   expired, or missing its PKCE verifier
    /// - [`ExportError::Network`] when the token exchange itself fails
    pub async fn complete_authorization(
        &self,
        code: &str,
        state: &str,
    ) -> Result<CompletedAuthorization> {
        let row = self
            .states
            .take(state)
            .await?
            .ok_or(ExportError::StateInvalidOrExpired(StateRejection::NotFound))?;

        if row.is_expired(Utc::now()) {
            return Err(ExportError::StateInvalidOrExpired(StateRejection::Expired));
        }
        if row.code_verifier.is_empty() {
            return Err(ExportError::StateInvalidOrExpired(StateRejection::MissingVerifier));
        }

        let grant = self.platform.exchange_code(code, &row.code_verifier).await?;

        let record = TokenRecord {
            user_id: row.uid.clone(),
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: Utc::now() + Duration::seconds(grant.expires_in),
        };
        self.tokens.upsert(&record).await?;

        info!(uid = %row.uid, "design platform connected");

        Ok(CompletedAuthorization { uid: row.uid, diary_id: row.diary_id })
    }

    /// Return an access token guaranteed usable for at least one remote
    /// call, refreshing first when the stored one is inside the skew window.
    ///
    /// All reads and updates of one user's record are serialized behind a
    /// per-user mutex, so at most one refresh is in flight per user; a
    /// caller that lost the race re-reads the record the winner stored.
    ///
    /// # Errors
    /// - [`ExportError::NotConnected`] when no record exists
    /// - [`ExportError::ReauthorizationRequired`] when refresh fails or no
    ///   refresh token is stored; the record is deleted first
    pub async fn get_valid_access_token(&self, uid: &str) -> Result<String> {
        let lock = self.user_lock(uid);
        let _guard = lock.lock().await;

        let record = self.tokens.get(uid).await?.ok_or(ExportError::NotConnected)?;

        if !record.needs_refresh(Utc::now()) {
            return Ok(record.access_token);
        }

        debug!(uid, "access token inside skew window; refreshing");
        self.refresh_under_lock(record).await
    }

    /// Report whether the user is connected, without touching the network
    /// or exposing the raw token.
    ///
    /// # Errors
    /// Returns [`ExportError::Storage`] when the store is unreachable.
    pub async fn connection_status(&self, uid: &str) -> Result<ConnectionStatus> {
        Ok(self.tokens.get(uid).await?.map_or_else(ConnectionStatus::disconnected, |record| {
            ConnectionStatus { connected: true, expires_at: Some(record.expires_at) }
        }))
    }

    fn user_lock(&self, uid: &str) -> Arc<Mutex<()>> {
        self.refresh_locks
            .entry(uid.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Refresh the given record. Caller must hold the user's lock.
    ///
    /// Any failure deletes the record: an unusable token is never left
    /// behind in a "maybe expired" state.
    async fn refresh_under_lock(&self, record: TokenRecord) -> Result<String> {
        let Some(refresh_token) = record.refresh_token.clone() else {
            warn!(uid = %record.user_id, "no refresh token stored; dropping connection");
            self.tokens.delete(&record.user_id).await?;
            return Err(ExportError::ReauthorizationRequired);
        };

        match self.platform.refresh_token(&refresh_token).await {
            Ok(grant) => {
                let updated = TokenRecord {
                    user_id: record.user_id.clone(),
                    access_token: grant.access_token.clone(),
                    // A refresh response may omit a new refresh token; the
                    // old one stays valid in that case.
                    refresh_token: grant.refresh_token.or(Some(refresh_token)),
                    expires_at: Utc::now() + Duration::seconds(grant.expires_in),
                };
                self.tokens.upsert(&updated).await?;
                debug!(uid = %record.user_id, "access token refreshed");
                Ok(grant.access_token)
            }
            Err(err) => {
                warn!(uid = %record.user_id, error = %err, "token refresh failed; dropping connection");
                self.tokens.delete(&record.user_id).await?;
                Err(ExportError::ReauthorizationRequired)
            }
        }
    }
}
