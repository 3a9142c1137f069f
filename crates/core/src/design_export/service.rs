//! Design-export service facade
//!
//! The operation surface the HTTP layer talks to. Wires the authorization
//! manager, token lifecycle, and job orchestrator together, and writes the
//! generated design reference onto the Diary record.

use std::sync::Arc;

use roamly_domain::{CanvaConfig, ConnectionStatus, DesignResult, Place, Result, Trip};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::authorization::AuthorizationManager;
use super::orchestrator::{JobOrchestrator, PollSettings};
use super::ports::{AuthStateStore, DesignPlatformApi, DiaryDesignStore, TokenStore};
use super::tokens::TokenLifecycle;

/// Outcome of a successful authorization callback.
#[derive(Debug, Clone)]
pub struct CompletedAuthorization {
    /// User whose connection was established.
    pub uid: String,
    /// Diary the authorization was started for, when one was given.
    pub diary_id: Option<String>,
}

/// High-level design-export service.
pub struct DesignExportService {
    authorization: AuthorizationManager,
    tokens: Arc<TokenLifecycle>,
    orchestrator: JobOrchestrator,
    diaries: Arc<dyn DiaryDesignStore>,
}

impl DesignExportService {
    /// Wire the full pipeline over the given stores and platform client.
    #[must_use]
    pub fn new(
        config: CanvaConfig,
        states: Arc<dyn AuthStateStore>,
        tokens: Arc<dyn TokenStore>,
        platform: Arc<dyn DesignPlatformApi>,
        diaries: Arc<dyn DiaryDesignStore>,
    ) -> Self {
        let authorization = AuthorizationManager::new(config.clone(), states.clone());
        let lifecycle = Arc::new(TokenLifecycle::new(states, tokens, platform.clone()));
        let orchestrator = JobOrchestrator::new(config, lifecycle.clone(), platform);

        Self { authorization, tokens: lifecycle, orchestrator, diaries }
    }

    /// Override the orchestrator's poll cadence.
    #[must_use]
    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.orchestrator = self.orchestrator.with_poll_settings(poll);
        self
    }

    /// Begin authorization; returns the URL to redirect the browser to.
    ///
    /// # Errors
    /// See [`AuthorizationManager::begin_authorization`].
    pub async fn begin_authorization(
        &self,
        uid: &str,
        diary_id: Option<&str>,
    ) -> Result<String> {
        self.authorization.begin_authorization(uid, diary_id).await
    }

    /// Handle the OAuth callback. On failure the HTTP layer should redirect
    /// with [`roamly_domain::ExportError::redirect_code`] rather than a 500.
    ///
    /// # Errors
    /// See [`TokenLifecycle::complete_authorization`].
    pub async fn complete_authorization(
        &self,
        code: &str,
        state: &str,
    ) -> Result<CompletedAuthorization> {
        self.tokens.complete_authorization(code, state).await
    }

    /// Current connection status for a user, without the raw token.
    ///
    /// # Errors
    /// Returns [`roamly_domain::ExportError::Storage`] on store failure.
    pub async fn connection_status(&self, uid: &str) -> Result<ConnectionStatus> {
        self.tokens.connection_status(uid).await
    }

    /// Generate a design for the trip and, when a diary is given, attach the
    /// result to it. Blocks until a terminal state or timeout.
    ///
    /// # Errors
    /// See [`JobOrchestrator::generate_design`].
    pub async fn generate_design(
        &self,
        uid: &str,
        diary_id: Option<&str>,
        trip: &Trip,
        places: &[Place],
        cancel: &CancellationToken,
    ) -> Result<DesignResult> {
        let result = self.orchestrator.generate_design(uid, trip, places, cancel).await?;

        if let Some(diary_id) = diary_id {
            self.diaries.attach_design(diary_id, &result).await?;
            info!(diary_id, design_id = %result.design_id, "design attached to diary");
        }

        Ok(result)
    }
}
