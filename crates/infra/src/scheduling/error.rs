//! Scheduler error types

use thiserror::Error;

/// Errors raised by the background schedulers.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler was started twice.
    #[error("scheduler is already running")]
    AlreadyRunning,

    /// Stop was called on a scheduler that never started.
    #[error("scheduler is not running")]
    NotRunning,

    /// The underlying scheduler could not be created.
    #[error("failed to create scheduler: {source}")]
    CreationFailed {
        /// Underlying scheduler error.
        source: tokio_cron_scheduler::JobSchedulerError,
    },

    /// A job definition was rejected (usually a bad cron expression).
    #[error("failed to register job: {source}")]
    JobRegistrationFailed {
        /// Underlying scheduler error.
        source: tokio_cron_scheduler::JobSchedulerError,
    },

    /// Starting or stopping the scheduler failed.
    #[error("scheduler lifecycle operation failed: {source}")]
    LifecycleFailed {
        /// Underlying scheduler error.
        source: tokio_cron_scheduler::JobSchedulerError,
    },
}

/// Result alias for scheduler operations.
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;
