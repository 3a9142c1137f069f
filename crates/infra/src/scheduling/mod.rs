//! Background maintenance scheduling

pub mod error;
pub mod state_purge;

pub use error::{SchedulerError, SchedulerResult};
pub use state_purge::{StatePurgeScheduler, StatePurgeSchedulerConfig};
