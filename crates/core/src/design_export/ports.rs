//! Port interfaces for the design-export pipeline
//!
//! These traits abstract the credential store, the remote design platform,
//! and the diary collaborator so the services in this module stay free of
//! I/O and can be tested against in-memory implementations.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roamly_domain::{AuthorizationState, DesignResult, Result, TokenRecord};

/// Store for pending authorization states, keyed by the anti-CSRF token.
#[async_trait]
pub trait AuthStateStore: Send + Sync {
    /// Persist a new state row.
    async fn put(&self, state: &AuthorizationState) -> Result<()>;

    /// Atomically remove and return the row for `state`, if present.
    ///
    /// Consumption and deletion are one operation so a replayed callback can
    /// never observe the same row twice.
    async fn take(&self, state: &str) -> Result<Option<AuthorizationState>>;

    /// Delete rows whose TTL elapsed before `now`. Returns the purge count.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// Store for per-user token records. One row per user, overwritten in place.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Fetch the record for `user_id`, if any.
    async fn get(&self, user_id: &str) -> Result<Option<TokenRecord>>;

    /// Insert or overwrite the record for `record.user_id`.
    async fn upsert(&self, record: &TokenRecord) -> Result<()>;

    /// Remove the record for `user_id`. Removing a missing record is not an
    /// error.
    async fn delete(&self, user_id: &str) -> Result<()>;
}

/// Fresh token material returned by the platform token endpoint.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    /// Bearer access token.
    pub access_token: String,
    /// Refresh token; a refresh response may omit it, in which case the
    /// previously stored one is retained.
    pub refresh_token: Option<String>,
    /// Access-token lifetime in seconds.
    pub expires_in: i64,
}

/// Field types a brand template dataset can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFieldType {
    /// Plain text field.
    Text,
    /// Image field filled with an asset id.
    Image,
}

/// Template dataset: field name to field type. Ordered for deterministic
/// iteration.
pub type TemplateSchema = BTreeMap<String, TemplateFieldType>;

/// Value supplied for one template field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Literal text.
    Text(String),
    /// Reference to a previously uploaded asset.
    Image {
        /// Platform asset identifier.
        asset_id: String,
    },
}

/// Autofill payload: field name to fill value. Fields with no resolvable
/// value are absent, letting the platform apply its template default.
pub type AutofillPayload = BTreeMap<String, FieldValue>;

/// Status of a remote autofill job.
#[derive(Debug, Clone)]
pub enum AutofillJobStatus {
    /// Still rendering.
    InProgress,
    /// Finished; the design lives at `design_url`.
    Success {
        /// URL of the generated design.
        design_url: String,
    },
    /// The platform gave up on the job.
    Failed {
        /// Remote status or error message.
        reason: String,
    },
}

/// Remote design-platform surface used by this pipeline.
///
/// One implementation exists in `roamly-infra` (the Canva Connect client);
/// tests use scripted in-memory versions.
#[async_trait]
pub trait DesignPlatformApi: Send + Sync {
    /// Exchange an authorization code plus PKCE verifier for tokens.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenGrant>;

    /// Obtain a new access token from a refresh token.
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant>;

    /// Fetch the named fields a brand template exposes for autofill.
    async fn fetch_template_dataset(
        &self,
        access_token: &str,
        template_id: &str,
    ) -> Result<TemplateSchema>;

    /// Fetch the source image at `source_url` and upload it as a platform
    /// asset, returning the asset id.
    async fn upload_asset(&self, access_token: &str, source_url: &str) -> Result<String>;

    /// Submit an autofill job for `template_id`. Returns the job id.
    async fn create_autofill_job(
        &self,
        access_token: &str,
        template_id: &str,
        payload: &AutofillPayload,
    ) -> Result<String>;

    /// Fetch the current status of an autofill job.
    async fn get_autofill_job(&self, access_token: &str, job_id: &str)
        -> Result<AutofillJobStatus>;

    /// Create an empty design, optionally seeded with an uploaded asset.
    /// Used when no brand template is configured.
    async fn create_design(
        &self,
        access_token: &str,
        title: &str,
        seed_asset_id: Option<&str>,
    ) -> Result<DesignResult>;
}

/// Update call onto the external Diary collaborator. This subsystem only
/// writes the design reference; it owns nothing else on the record.
#[async_trait]
pub trait DiaryDesignStore: Send + Sync {
    /// Attach a generated design to a diary record.
    async fn attach_design(&self, diary_id: &str, design: &DesignResult) -> Result<()>;
}
