//! Scheduler error types.

use steward_election::ElectionError;
use thiserror::Error;

use crate::report::RunReport;

/// Errors that can occur while registering or running jobs.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid schedule for job {job}: {reason}")]
    InvalidSchedule { job: String, reason: String },

    #[error("job already registered: {0}")]
    DuplicateJob(String),

    #[error("invalid trigger config: {0}")]
    InvalidConfig(String),

    #[error("scheduling errors in {} job(s): {}", .failed.len(), .failed.join(", "))]
    JobsFailed {
        failed: Vec<String>,
        report: Box<RunReport>,
    },

    #[error("election error: {0}")]
    Election(#[from] ElectionError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
