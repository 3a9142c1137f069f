//! Autofill job orchestrator
//!
//! Drives one design generation end to end as an explicit state machine:
//!
//! ```text
//! NotStarted → Submitted → Polling → { Succeeded | Failed | TimedOut }
//! ```
//!
//! The no-template fallback path creates an empty design directly and never
//! enters `Polling`. Nothing here is retried automatically; the caller may
//! repeat the whole call, which creates a new job/design each time.

use std::sync::Arc;
use std::time::Duration;

use roamly_domain::constants::{JOB_POLL_INTERVAL_SECONDS, JOB_POLL_TIMEOUT_SECONDS};
use roamly_domain::types::trip::collect_image_urls;
use roamly_domain::{CanvaConfig, DesignResult, ExportError, Place, Result, Trip};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::assets::AssetBridge;
use super::ports::{AutofillJobStatus, DesignPlatformApi};
use super::template::TemplateMapper;
use super::tokens::TokenLifecycle;

/// Phases of one design-generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    /// Nothing submitted yet; failures here leave no orphaned remote job.
    NotStarted,
    /// Autofill job accepted by the platform.
    Submitted,
    /// Waiting for the job to reach a terminal status.
    Polling,
    /// Terminal: design reference extracted.
    Succeeded,
    /// Terminal: the platform reported failure.
    Failed,
    /// Terminal: deadline elapsed or the caller cancelled; the remote job is
    /// abandoned, not cancelled.
    TimedOut,
}

/// Poll cadence and overall deadline for the job loop.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    /// Fixed interval between status fetches.
    pub interval: Duration,
    /// Overall deadline for the job to finish.
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(JOB_POLL_INTERVAL_SECONDS),
            timeout: Duration::from_secs(JOB_POLL_TIMEOUT_SECONDS),
        }
    }
}

/// Submits an autofill job and polls it to completion.
pub struct JobOrchestrator {
    config: CanvaConfig,
    tokens: Arc<TokenLifecycle>,
    platform: Arc<dyn DesignPlatformApi>,
    assets: AssetBridge,
    mapper: TemplateMapper,
    poll: PollSettings,
}

impl JobOrchestrator {
    /// Create an orchestrator with the default poll settings.
    #[must_use]
    pub fn new(
        config: CanvaConfig,
        tokens: Arc<TokenLifecycle>,
        platform: Arc<dyn DesignPlatformApi>,
    ) -> Self {
        Self {
            config,
            tokens,
            assets: AssetBridge::new(platform.clone()),
            mapper: TemplateMapper::new(platform.clone()),
            platform,
            poll: PollSettings::default(),
        }
    }

    /// Override the poll cadence (tests and impatient callers).
    #[must_use]
    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Generate a design for the trip and return its reference.
    ///
    /// Blocks until the pipeline reaches a terminal state, the overall poll
    /// deadline elapses, or `cancel` fires.
    ///
    /// # Errors
    /// See the taxonomy on [`ExportError`]; notably
    /// [`ExportError::NoContentAvailable`] for a trip without places and
    /// [`ExportError::JobTimedOut`] when the deadline elapses.
    pub async fn generate_design(
        &self,
        uid: &str,
        trip: &Trip,
        places: &[Place],
        cancel: &CancellationToken,
    ) -> Result<DesignResult> {
        // Resolve the token first: failure aborts before any remote job is
        // created, so nothing is orphaned.
        let access_token = self.tokens.get_valid_access_token(uid).await?;

        if places.is_empty() {
            return Err(ExportError::NoContentAvailable);
        }

        let image_urls = collect_image_urls(trip, places);

        match self.config.brand_template_id.as_deref() {
            Some(template_id) => {
                self.generate_from_template(
                    &access_token,
                    template_id,
                    trip,
                    places,
                    &image_urls,
                    cancel,
                )
                .await
            }
            None => self.generate_without_template(&access_token, trip, &image_urls).await,
        }
    }

    async fn generate_from_template(
        &self,
        access_token: &str,
        template_id: &str,
        trip: &Trip,
        places: &[Place],
        image_urls: &[String],
        cancel: &CancellationToken,
    ) -> Result<DesignResult> {
        // Everything up to submission is JobPhase::NotStarted: a failure
        // here leaves no orphaned remote job.
        let schema = self.mapper.fetch_template_schema(access_token, template_id).await?;
        // Uploads complete before the payload referencing them is built.
        let assets = self.assets.upload_assets(access_token, image_urls).await;
        let payload = TemplateMapper::build_autofill_payload(&schema, trip, places, &assets)?;

        let job_id =
            self.platform.create_autofill_job(access_token, template_id, &payload).await?;
        let phase = JobPhase::Submitted;
        debug!(?phase, job_id, trip_id = %trip.id, "autofill job submitted");

        self.poll_job(access_token, &job_id, cancel).await
    }

    /// No-template fallback: upload the same image set and create an empty
    /// design seeded with the cover asset. Skips straight to a terminal
    /// state and never enters `Polling`.
    async fn generate_without_template(
        &self,
        access_token: &str,
        trip: &Trip,
        image_urls: &[String],
    ) -> Result<DesignResult> {
        let assets = self.assets.upload_assets(access_token, image_urls).await;
        let seed_asset_id =
            trip.cover_image_url.as_deref().and_then(|url| assets.get(url)).map(String::as_str);

        let result = self.platform.create_design(access_token, &trip.title, seed_asset_id).await?;
        info!(design_id = %result.design_id, trip_id = %trip.id, "design created without template");
        Ok(result)
    }

    async fn poll_job(
        &self,
        access_token: &str,
        job_id: &str,
        cancel: &CancellationToken,
    ) -> Result<DesignResult> {
        let mut phase = JobPhase::Polling;
        debug!(?phase, job_id, "polling autofill job");

        let deadline = tokio::time::Instant::now() + self.poll.timeout;

        loop {
            match self.platform.get_autofill_job(access_token, job_id).await {
                Ok(AutofillJobStatus::Success { design_url }) => {
                    let result = parse_design_result(&design_url)?;
                    phase = JobPhase::Succeeded;
                    info!(?phase, job_id, design_id = %result.design_id, "autofill job finished");
                    return Ok(result);
                }
                Ok(AutofillJobStatus::Failed { reason }) => {
                    phase = JobPhase::Failed;
                    warn!(?phase, job_id, reason, "autofill job failed remotely");
                    return Err(ExportError::JobFailed(reason));
                }
                Ok(AutofillJobStatus::InProgress) => {}
                // A transient poll error should not abort an otherwise
                // successful job; keep retrying until the deadline.
                Err(err) => warn!(job_id, error = %err, "job poll failed; retrying"),
            }

            let now = tokio::time::Instant::now();
            if now >= deadline {
                phase = JobPhase::TimedOut;
                warn!(?phase, job_id, "autofill job deadline elapsed; abandoning job");
                return Err(ExportError::JobTimedOut);
            }

            let sleep_for = self.poll.interval.min(deadline - now);
            tokio::select! {
                () = cancel.cancelled() => {
                    phase = JobPhase::TimedOut;
                    info!(?phase, job_id, "export cancelled; abandoning job");
                    return Err(ExportError::JobTimedOut);
                }
                () = tokio::time::sleep(sleep_for) => {}
            }

            if tokio::time::Instant::now() >= deadline {
                phase = JobPhase::TimedOut;
                warn!(?phase, job_id, "autofill job deadline elapsed; abandoning job");
                return Err(ExportError::JobTimedOut);
            }
        }
    }
}

/// Extract the design reference from a job-result URL.
///
/// The identifier is the path segment between `/design/` and the next `/`;
/// anything else is a malformed result. View and edit links are derived from
/// the same origin.
fn parse_design_result(design_url: &str) -> Result<DesignResult> {
    let parsed = Url::parse(design_url).map_err(|err| {
        ExportError::MalformedJobResult(format!("unparseable design URL '{design_url}': {err}"))
    })?;

    let segments: Vec<&str> =
        parsed.path_segments().map(Iterator::collect).unwrap_or_default();

    let design_id = segments
        .iter()
        .position(|segment| *segment == "design")
        .and_then(|index| segments.get(index + 1))
        .filter(|id| !id.is_empty())
        .map(|id| (*id).to_string())
        .ok_or_else(|| {
            ExportError::MalformedJobResult(format!(
                "no /design/<id>/ segment in '{design_url}'"
            ))
        })?;

    let origin = parsed.origin().ascii_serialization();
    Ok(DesignResult {
        design_url: format!("{origin}/design/{design_id}/view"),
        editor_url: format!("{origin}/design/{design_id}/edit"),
        design_id,
    })
}
