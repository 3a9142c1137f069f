//! Error types used throughout the design-export subsystem

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason an authorization state row was rejected during callback handling.
///
/// Granularity exists so the HTTP layer can redirect with a machine-readable
/// error code instead of an opaque 500.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateRejection {
    /// No authorization state exists for the supplied token (unknown,
    /// already consumed, or forged).
    NotFound,

    /// The state row existed but its TTL had elapsed.
    Expired,

    /// The state row was persisted without a PKCE code verifier.
    MissingVerifier,
}

impl StateRejection {
    /// Machine-readable code used in callback redirects.
    #[must_use]
    pub fn redirect_code(&self) -> &'static str {
        match self {
            Self::NotFound => "invalid_state",
            Self::Expired => "state_expired",
            Self::MissingVerifier => "missing_code_verifier",
        }
    }
}

/// Main error type for the design-export subsystem.
///
/// Every external-call failure is translated into one of these kinds at its
/// call site; no raw transport error crosses a component boundary.
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum ExportError {
    /// Client credentials or another required setting is absent.
    #[error("Design platform is not configured: {0}")]
    ConfigurationMissing(String),

    /// The OAuth callback carried a state token we cannot honor.
    #[error("Authorization state rejected ({})", .0.redirect_code())]
    StateInvalidOrExpired(StateRejection),

    /// No token record exists for the user.
    #[error("Design platform account is not connected")]
    NotConnected,

    /// The stored token could not be refreshed; interactive re-authorization
    /// is required.
    #[error("Design platform connection expired; re-authorization required")]
    ReauthorizationRequired,

    /// The trip has no places, so there is nothing to autofill.
    #[error("Trip has no places to export")]
    NoContentAvailable,

    /// The autofill job finished but its result could not be interpreted.
    #[error("Autofill job returned an unexpected result: {0}")]
    MalformedJobResult(String),

    /// The remote autofill job reported failure.
    #[error("Autofill job failed: {0}")]
    JobFailed(String),

    /// The autofill job did not reach a terminal state before the deadline.
    #[error("Autofill job timed out")]
    JobTimedOut,

    /// Credential store failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Remote platform or image host unreachable / transport failure.
    #[error("Network error: {0}")]
    Network(String),
}

impl ExportError {
    /// Machine-readable code for callback redirects.
    ///
    /// The HTTP layer appends this to the post-authorization redirect so the
    /// client can render a specific prompt rather than a generic failure.
    #[must_use]
    pub fn redirect_code(&self) -> String {
        match self {
            Self::StateInvalidOrExpired(rejection) => rejection.redirect_code().to_string(),
            Self::ConfigurationMissing(_) => "configuration_missing".to_string(),
            other => other.to_string(),
        }
    }

    /// Short, user-facing message for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ConfigurationMissing(_) => {
                "Design export is not set up for this workspace. Contact support.".to_string()
            }
            Self::StateInvalidOrExpired(_) => {
                "The authorization link is no longer valid. Please connect again.".to_string()
            }
            Self::NotConnected => {
                "Connect your design platform account to export this trip.".to_string()
            }
            Self::ReauthorizationRequired => {
                "Your design platform connection expired. Please connect again.".to_string()
            }
            Self::NoContentAvailable => {
                "Add at least one place to the trip before exporting.".to_string()
            }
            Self::JobTimedOut => {
                "The design is taking longer than expected. It may still appear in your \
                 design platform account shortly."
                    .to_string()
            }
            Self::MalformedJobResult(_) | Self::JobFailed(_) => {
                "The design platform could not generate this design. Please try again.".to_string()
            }
            Self::Storage(_) | Self::Network(_) => {
                "Something went wrong talking to the design platform. Please try again.".to_string()
            }
        }
    }

    /// Whether retrying the whole operation can help.
    ///
    /// Authorization-shaped failures need user interaction first; transport
    /// and job failures are safe to retry as a whole new call.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Network(_) | Self::JobFailed(_) | Self::JobTimedOut
        )
    }
}

/// Result type alias for design-export operations
pub type Result<T> = std::result::Result<T, ExportError>;
