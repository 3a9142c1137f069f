//! Shared in-memory port implementations for unit tests.
//!
//! `ScriptedPlatform` plays the remote design platform with per-test
//! scripting hooks; the in-memory stores give the services real (if
//! volatile) persistence semantics, including atomic state consumption.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use roamly_domain::{
    AuthorizationState, CanvaConfig, DesignResult, ExportError, Place, Result, TokenRecord, Trip,
};
use tokio::sync::Mutex;

use super::ports::{
    AuthStateStore, AutofillJobStatus, AutofillPayload, DesignPlatformApi, DiaryDesignStore,
    TemplateFieldType, TemplateSchema, TokenGrant, TokenStore,
};

/// A usable Canva configuration without a brand template.
pub(crate) fn test_canva_config() -> CanvaConfig {
    CanvaConfig {
        client_id: "test-client".to_string(),
        client_secret: None,
        redirect_uri: "https://app.roamly.io/integrations/canva/callback".to_string(),
        scopes: vec!["asset:write".to_string(), "design:content:write".to_string()],
        brand_template_id: None,
        authorization_endpoint: "https://www.canva.com/api/oauth/authorize".to_string(),
        api_base_url: "https://api.canva.com/rest".to_string(),
    }
}

/// Token record with fixed access/refresh tokens expiring in `seconds`.
pub(crate) fn token_record_expiring_in(user_id: &str, seconds: i64) -> TokenRecord {
    TokenRecord {
        user_id: user_id.to_string(),
        access_token: "stored-access".to_string(),
        refresh_token: Some("stored-refresh".to_string()),
        expires_at: Utc::now() + Duration::seconds(seconds),
    }
}

/// A one-place trip with a cover image.
pub(crate) fn eiffel_trip() -> (Trip, Vec<Place>) {
    let trip = Trip {
        id: "trip-1".to_string(),
        title: "Paris in spring".to_string(),
        description: Some("Three days around the Seine".to_string()),
        cover_image_url: Some("https://img.roamly.io/cover.jpg".to_string()),
    };
    let places = vec![Place {
        id: "place-1".to_string(),
        name: "Eiffel Tower".to_string(),
        visited_at: Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).single().expect("valid time"),
        rating: Some(4.5),
        comment: Some("crowded but worth it".to_string()),
        rewritten_comment: None,
        image_urls: vec!["https://img.roamly.io/tower.jpg".to_string()],
    }];
    (trip, places)
}

// ============================================================================
// In-memory stores
// ============================================================================

/// HashMap-backed [`AuthStateStore`] with atomic take semantics.
#[derive(Default)]
pub(crate) struct InMemoryAuthStateStore {
    rows: Mutex<HashMap<String, AuthorizationState>>,
}

impl InMemoryAuthStateStore {
    /// Snapshot of all rows, for assertions.
    pub(crate) async fn all(&self) -> Vec<AuthorizationState> {
        self.rows.lock().await.values().cloned().collect()
    }
}

#[async_trait]
impl AuthStateStore for InMemoryAuthStateStore {
    async fn put(&self, state: &AuthorizationState) -> Result<()> {
        self.rows.lock().await.insert(state.state.clone(), state.clone());
        Ok(())
    }

    async fn take(&self, state: &str) -> Result<Option<AuthorizationState>> {
        Ok(self.rows.lock().await.remove(state))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|_, row| !row.is_expired(now));
        Ok(before - rows.len())
    }
}

/// HashMap-backed [`TokenStore`].
#[derive(Default)]
pub(crate) struct InMemoryTokenStore {
    rows: Mutex<HashMap<String, TokenRecord>>,
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self, user_id: &str) -> Result<Option<TokenRecord>> {
        Ok(self.rows.lock().await.get(user_id).cloned())
    }

    async fn upsert(&self, record: &TokenRecord) -> Result<()> {
        self.rows.lock().await.insert(record.user_id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        self.rows.lock().await.remove(user_id);
        Ok(())
    }
}

/// Records every attach call for assertions.
#[derive(Default)]
pub(crate) struct RecordingDiaryStore {
    attached: Mutex<Vec<(String, DesignResult)>>,
}

impl RecordingDiaryStore {
    pub(crate) async fn attached(&self) -> Vec<(String, DesignResult)> {
        self.attached.lock().await.clone()
    }
}

#[async_trait]
impl DiaryDesignStore for RecordingDiaryStore {
    async fn attach_design(&self, diary_id: &str, design: &DesignResult) -> Result<()> {
        self.attached.lock().await.push((diary_id.to_string(), design.clone()));
        Ok(())
    }
}

// ============================================================================
// Scripted platform
// ============================================================================

/// Scriptable stand-in for the remote design platform.
pub(crate) struct ScriptedPlatform {
    exchange_failure: Mutex<Option<String>>,
    refresh_failure: Mutex<Option<String>>,
    omit_refresh_token: Mutex<bool>,
    refresh_delay_ms: Mutex<u64>,
    failing_uploads: Mutex<HashSet<String>>,
    schema: Mutex<TemplateSchema>,
    in_progress_polls: Mutex<usize>,
    success_url: Mutex<Option<String>>,
    job_failure: Mutex<Option<String>>,
    poll_failures: Mutex<usize>,
    never_finishes: Mutex<bool>,
    last_design_seed: Mutex<Option<String>>,
    exchange_count: AtomicUsize,
    refresh_count: AtomicUsize,
    upload_count: AtomicUsize,
    autofill_count: AtomicUsize,
    poll_count: AtomicUsize,
}

impl Default for ScriptedPlatform {
    fn default() -> Self {
        let schema: TemplateSchema = [
            ("time".to_string(), TemplateFieldType::Text),
            ("place".to_string(), TemplateFieldType::Text),
            ("comments".to_string(), TemplateFieldType::Text),
            ("cover_image".to_string(), TemplateFieldType::Image),
        ]
        .into_iter()
        .collect();

        Self {
            exchange_failure: Mutex::new(None),
            refresh_failure: Mutex::new(None),
            omit_refresh_token: Mutex::new(false),
            refresh_delay_ms: Mutex::new(0),
            failing_uploads: Mutex::new(HashSet::new()),
            schema: Mutex::new(schema),
            in_progress_polls: Mutex::new(0),
            success_url: Mutex::new(None),
            job_failure: Mutex::new(None),
            poll_failures: Mutex::new(0),
            never_finishes: Mutex::new(false),
            last_design_seed: Mutex::new(None),
            exchange_count: AtomicUsize::new(0),
            refresh_count: AtomicUsize::new(0),
            upload_count: AtomicUsize::new(0),
            autofill_count: AtomicUsize::new(0),
            poll_count: AtomicUsize::new(0),
        }
    }
}

impl ScriptedPlatform {
    pub(crate) async fn fail_exchange(&self, message: &str) {
        *self.exchange_failure.lock().await = Some(message.to_string());
    }

    pub(crate) async fn fail_refresh(&self, message: &str) {
        *self.refresh_failure.lock().await = Some(message.to_string());
    }

    pub(crate) async fn omit_refresh_token_on_refresh(&self) {
        *self.omit_refresh_token.lock().await = true;
    }

    pub(crate) async fn delay_refresh_ms(&self, millis: u64) {
        *self.refresh_delay_ms.lock().await = millis;
    }

    pub(crate) async fn fail_uploads_for(&self, urls: &[&str]) {
        let mut failing = self.failing_uploads.lock().await;
        failing.extend(urls.iter().map(|url| (*url).to_string()));
    }

    /// Report `in_progress` for `polls` fetches, then succeed with `url`.
    pub(crate) async fn job_status_sequence(&self, polls: usize, url: &str) {
        *self.in_progress_polls.lock().await = polls;
        *self.success_url.lock().await = Some(url.to_string());
    }

    pub(crate) async fn job_fails_with(&self, reason: &str) {
        *self.job_failure.lock().await = Some(reason.to_string());
    }

    pub(crate) async fn job_never_finishes(&self) {
        *self.never_finishes.lock().await = true;
    }

    /// Error out the next `count` status fetches before honoring the script.
    pub(crate) async fn fail_next_polls(&self, count: usize) {
        *self.poll_failures.lock().await = count;
    }

    pub(crate) async fn last_design_seed(&self) -> Option<String> {
        self.last_design_seed.lock().await.clone()
    }

    pub(crate) fn exchange_calls(&self) -> usize {
        self.exchange_count.load(Ordering::SeqCst)
    }

    pub(crate) fn refresh_calls(&self) -> usize {
        self.refresh_count.load(Ordering::SeqCst)
    }

    pub(crate) fn upload_calls(&self) -> usize {
        self.upload_count.load(Ordering::SeqCst)
    }

    pub(crate) fn autofill_calls(&self) -> usize {
        self.autofill_count.load(Ordering::SeqCst)
    }

    pub(crate) fn poll_calls(&self) -> usize {
        self.poll_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DesignPlatformApi for ScriptedPlatform {
    async fn exchange_code(&self, _code: &str, _code_verifier: &str) -> Result<TokenGrant> {
        self.exchange_count.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.exchange_failure.lock().await.clone() {
            return Err(ExportError::Network(message));
        }
        Ok(TokenGrant {
            access_token: "access-1".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_in: 3600,
        })
    }

    async fn refresh_token(&self, _refresh_token: &str) -> Result<TokenGrant> {
        self.refresh_count.fetch_add(1, Ordering::SeqCst);
        let delay = *self.refresh_delay_ms.lock().await;
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        if let Some(message) = self.refresh_failure.lock().await.clone() {
            return Err(ExportError::Network(message));
        }
        let refresh_token = if *self.omit_refresh_token.lock().await {
            None
        } else {
            Some("refreshed-refresh".to_string())
        };
        Ok(TokenGrant {
            access_token: "refreshed-access".to_string(),
            refresh_token,
            expires_in: 3600,
        })
    }

    async fn fetch_template_dataset(
        &self,
        _access_token: &str,
        _template_id: &str,
    ) -> Result<TemplateSchema> {
        Ok(self.schema.lock().await.clone())
    }

    async fn upload_asset(&self, _access_token: &str, source_url: &str) -> Result<String> {
        self.upload_count.fetch_add(1, Ordering::SeqCst);
        if self.failing_uploads.lock().await.contains(source_url) {
            return Err(ExportError::Network(format!("failed to fetch {source_url}")));
        }
        Ok(format!("asset-{source_url}"))
    }

    async fn create_autofill_job(
        &self,
        _access_token: &str,
        _template_id: &str,
        _payload: &AutofillPayload,
    ) -> Result<String> {
        self.autofill_count.fetch_add(1, Ordering::SeqCst);
        Ok("job-1".to_string())
    }

    async fn get_autofill_job(
        &self,
        _access_token: &str,
        _job_id: &str,
    ) -> Result<AutofillJobStatus> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);

        {
            let mut failures = self.poll_failures.lock().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(ExportError::Network("status fetch failed".to_string()));
            }
        }

        if *self.never_finishes.lock().await {
            return Ok(AutofillJobStatus::InProgress);
        }

        {
            let mut remaining = self.in_progress_polls.lock().await;
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(AutofillJobStatus::InProgress);
            }
        }

        if let Some(reason) = self.job_failure.lock().await.clone() {
            return Ok(AutofillJobStatus::Failed { reason });
        }
        if let Some(design_url) = self.success_url.lock().await.clone() {
            return Ok(AutofillJobStatus::Success { design_url });
        }
        Ok(AutofillJobStatus::InProgress)
    }

    async fn create_design(
        &self,
        _access_token: &str,
        _title: &str,
        seed_asset_id: Option<&str>,
    ) -> Result<DesignResult> {
        *self.last_design_seed.lock().await = seed_asset_id.map(ToString::to_string);
        Ok(DesignResult {
            design_id: "design-direct".to_string(),
            design_url: "https://platform.example/design/design-direct/view".to_string(),
            editor_url: "https://platform.example/design/design-direct/edit".to_string(),
        })
    }
}
