//! Authorization manager: begins the OAuth dance safely
//!
//! Generates PKCE material and an anti-CSRF state token, persists the
//! pending [`AuthorizationState`], and returns the provider authorization
//! URL. No call to the token endpoint happens here.

use std::sync::Arc;

use chrono::Utc;
use roamly_domain::{AuthorizationState, CanvaConfig, ExportError, Result};
use tracing::{debug, warn};

use super::pkce::{generate_state_token, PkceMaterial};
use super::ports::AuthStateStore;

/// Builds authorization URLs and records the matching pending state.
pub struct AuthorizationManager {
    config: CanvaConfig,
    states: Arc<dyn AuthStateStore>,
}

impl AuthorizationManager {
    /// Create a manager over the given state store.
    #[must_use]
    pub fn new(config: CanvaConfig, states: Arc<dyn AuthStateStore>) -> Self {
        Self { config, states }
    }

    /// Begin authorization for `uid`, optionally correlated with a diary.
    ///
    /// Persists one `AuthorizationState` row with a 10-minute TTL and
    /// returns the URL to redirect the user's browser to.
    ///
    /// # Errors
    /// - [`ExportError::ConfigurationMissing`] when client credentials are
    ///   not configured
    /// - [`ExportError::Storage`] when the state row cannot be persisted
    pub async fn begin_authorization(
        &self,
        uid: &str,
        diary_id: Option<&str>,
    ) -> Result<String> {
        if !self.config.is_configured() {
            return Err(ExportError::ConfigurationMissing(
                "canva client_id / redirect_uri not configured".to_string(),
            ));
        }

        // Opportunistic cleanup; an unreachable store must not block the
        // login itself, the put below will surface real storage failures.
        match self.states.purge_expired(Utc::now()).await {
            Ok(0) => {}
            Ok(purged) => debug!(purged, "purged expired authorization states"),
            Err(err) => warn!(error = %err, "authorization state purge failed"),
        }

        let material = PkceMaterial::generate();
        let state = generate_state_token();

        let row = AuthorizationState::new(
            state.clone(),
            uid.to_string(),
            diary_id.map(ToString::to_string),
            material.code_verifier.clone(),
        );
        self.states.put(&row).await?;

        debug!(uid, diary_id, "authorization state created");

        Ok(self.build_authorization_url(&state, &material.code_challenge))
    }

    fn build_authorization_url(&self, state: &str, code_challenge: &str) -> String {
        let scope_string = self.config.scope_string();
        let params = [
            ("response_type", "code"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("scope", scope_string.as_str()),
            ("state", state),
            ("code_challenge", code_challenge),
            ("code_challenge_method", PkceMaterial::challenge_method()),
        ];

        let query = params
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.config.authorization_endpoint, query)
    }
}
