//! OAuth credential records persisted by the credential store

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{AUTHORIZATION_STATE_TTL_MINUTES, TOKEN_EXPIRY_SKEW_SECONDS};

/// Pending authorization attempt, keyed by the anti-CSRF state token.
///
/// Created when an authorization URL is built; consumed exactly once when the
/// callback arrives. Rows live for ten minutes and are purged afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationState {
    /// Opaque random state token (primary key).
    pub state: String,
    /// User who started the authorization.
    pub uid: String,
    /// Diary the eventual design should be attached to, when known.
    pub diary_id: Option<String>,
    /// PKCE code verifier held until token exchange.
    pub code_verifier: String,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Hard expiry; always `created_at` + 10 minutes.
    pub expires_at: DateTime<Utc>,
}

impl AuthorizationState {
    /// Create a new state row with the fixed TTL.
    #[must_use]
    pub fn new(
        state: String,
        uid: String,
        diary_id: Option<String>,
        code_verifier: String,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            state,
            uid,
            diary_id,
            code_verifier,
            created_at,
            expires_at: created_at + Duration::minutes(AUTHORIZATION_STATE_TTL_MINUTES),
        }
    }

    /// Whether the row has outlived its TTL.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Stored OAuth token pair for one user. One row per user, no history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Owning user id (primary key).
    pub user_id: String,
    /// Bearer access token.
    pub access_token: String,
    /// Refresh token; some grants omit it.
    pub refresh_token: Option<String>,
    /// Absolute access-token expiry.
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Whether the access token must be refreshed before use.
    ///
    /// True once `now` is inside the skew window of `expires_at`, so a token
    /// handed out here is still valid for at least one subsequent remote
    /// call. A token expiring exactly at `now + skew` is still usable.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_EXPIRY_SKEW_SECONDS) > self.expires_at
    }
}

/// Connection summary exposed to callers without revealing the raw token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// Whether a token record exists for the user.
    pub connected: bool,
    /// Access-token expiry, when connected.
    pub expires_at: Option<DateTime<Utc>>,
}

impl ConnectionStatus {
    /// Status for a user with no stored tokens.
    #[must_use]
    pub fn disconnected() -> Self {
        Self { connected: false, expires_at: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_ttl_is_exactly_ten_minutes() {
        let state = AuthorizationState::new(
            "state-token".to_string(),
            "user-1".to_string(),
            None,
            "verifier".to_string(),
        );
        assert_eq!(state.expires_at - state.created_at, Duration::minutes(10));
    }

    #[test]
    fn state_expiry_boundary_is_inclusive() {
        let state = AuthorizationState::new(
            "state-token".to_string(),
            "user-1".to_string(),
            Some("diary-1".to_string()),
            "verifier".to_string(),
        );
        assert!(!state.is_expired(state.expires_at - Duration::seconds(1)));
        assert!(state.is_expired(state.expires_at));
    }

    #[test]
    fn refresh_triggers_inside_skew_window() {
        let now = Utc::now();
        let record = |expires_at| TokenRecord {
            user_id: "user-1".to_string(),
            access_token: "token".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at,
        };

        // Already expired, expiring now, and expiring within the skew window
        // all trigger a refresh; exactly at now + skew does not.
        assert!(record(now - Duration::seconds(1)).needs_refresh(now));
        assert!(record(now).needs_refresh(now));
        assert!(record(now + Duration::seconds(TOKEN_EXPIRY_SKEW_SECONDS - 1)).needs_refresh(now));
        assert!(!record(now + Duration::seconds(TOKEN_EXPIRY_SKEW_SECONDS)).needs_refresh(now));
    }
}
