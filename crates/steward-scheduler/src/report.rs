//! Run reports: what ran, when, and how it went.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What caused a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunSource {
    /// The leader's internal tick loop.
    Tick,
    /// An authenticated call to the schedule endpoint.
    Endpoint,
}

/// Result of one job invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// One tick or one endpoint-triggered run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub source: RunSource,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub jobs: Vec<JobOutcome>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.jobs.iter().all(|j| j.succeeded)
    }

    /// Names of failed jobs, in run order.
    pub fn failed_jobs(&self) -> Vec<String> {
        self.jobs
            .iter()
            .filter(|j| !j.succeeded)
            .map(|j| j.job.clone())
            .collect()
    }
}
