//! Expired authorization-state purge scheduler
//!
//! Authorization states carry a ten-minute TTL; most rows are consumed at
//! callback time, but abandoned logins leave them behind. This cron job
//! deletes expired rows so the table does not accumulate forever.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use roamly_core::design_export::ports::AuthStateStore;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};

use super::error::{SchedulerError, SchedulerResult};

/// Configuration for the purge scheduler.
#[derive(Debug, Clone)]
pub struct StatePurgeSchedulerConfig {
    /// Cron expression describing the execution schedule.
    pub cron_expression: String,
    /// Timeout applied to a single purge execution.
    pub job_timeout: Duration,
}

impl Default for StatePurgeSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: "0 */10 * * * *".into(), // every 10 minutes
            job_timeout: Duration::from_secs(30),
        }
    }
}

/// Periodically purges expired authorization states.
pub struct StatePurgeScheduler {
    scheduler: Option<JobScheduler>,
    config: StatePurgeSchedulerConfig,
    states: Arc<dyn AuthStateStore>,
}

impl StatePurgeScheduler {
    /// Create a scheduler with the default configuration.
    #[must_use]
    pub fn new(states: Arc<dyn AuthStateStore>) -> Self {
        Self::with_config(StatePurgeSchedulerConfig::default(), states)
    }

    /// Create a scheduler with a custom configuration.
    #[must_use]
    pub fn with_config(
        config: StatePurgeSchedulerConfig,
        states: Arc<dyn AuthStateStore>,
    ) -> Self {
        Self { scheduler: None, config, states }
    }

    /// Start the scheduler.
    ///
    /// # Errors
    /// Returns [`SchedulerError::AlreadyRunning`] on a double start, or a
    /// creation/registration error from the underlying scheduler.
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let scheduler = self.build_scheduler().await?;
        scheduler.start().await.map_err(|source| SchedulerError::LifecycleFailed { source })?;
        self.scheduler = Some(scheduler);

        info!(cron = %self.config.cron_expression, "state purge scheduler started");
        Ok(())
    }

    /// Stop the scheduler.
    ///
    /// # Errors
    /// Returns [`SchedulerError::NotRunning`] when the scheduler was never
    /// started.
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let mut scheduler = self.scheduler.take().ok_or(SchedulerError::NotRunning)?;
        scheduler
            .shutdown()
            .await
            .map_err(|source| SchedulerError::LifecycleFailed { source })?;

        info!("state purge scheduler stopped");
        Ok(())
    }

    /// Returns true when a scheduler instance is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|source| SchedulerError::CreationFailed { source })?;

        let states = self.states.clone();
        let job_timeout = self.config.job_timeout;

        let job = Job::new_async(self.config.cron_expression.as_str(), move |_id, _lock| {
            let states = states.clone();
            Box::pin(async move {
                match tokio::time::timeout(job_timeout, states.purge_expired(Utc::now())).await {
                    Ok(Ok(0)) => debug!("no expired authorization states to purge"),
                    Ok(Ok(purged)) => info!(purged, "purged expired authorization states"),
                    Ok(Err(err)) => error!(error = %err, "authorization state purge failed"),
                    Err(_) => {
                        warn!(timeout_secs = job_timeout.as_secs(), "state purge timed out");
                    }
                }
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        scheduler
            .add(job)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        Ok(scheduler)
    }
}

impl Drop for StatePurgeScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("StatePurgeScheduler dropped while running");
        }
    }
}
