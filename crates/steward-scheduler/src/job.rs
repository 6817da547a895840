//! Job descriptors and cron schedules.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, error};

use crate::report::JobOutcome;

pub type JobFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// Shared job body. Called once per invocation.
pub type JobAction = Arc<dyn Fn() -> JobFuture + Send + Sync>;

pub(crate) fn boxed_action<F, Fut>(action: F) -> JobAction
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move || Box::pin(action()) as JobFuture)
}

/// A parsed cron expression.
///
/// Five-field crontab expressions (minute resolution) get a leading `0`
/// seconds field; six and seven field expressions are used as given.
#[derive(Clone)]
pub struct CronSchedule {
    expr: String,
    schedule: cron::Schedule,
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self, String> {
        let expr = expr.trim();
        let normalized = match expr.split_whitespace().count() {
            5 => format!("0 {expr}"),
            _ => expr.to_string(),
        };
        let schedule = cron::Schedule::from_str(&normalized).map_err(|e| e.to_string())?;
        Ok(Self {
            expr: expr.to_string(),
            schedule,
        })
    }

    /// The expression as written.
    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// First occurrence strictly after `from`.
    pub fn next_after(&self, from: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(from).next()
    }
}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronSchedule").field(&self.expr).finish()
    }
}

/// When a job is due.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Every leader tick.
    Always,
    /// On cron occurrences, checked at each leader tick.
    Cron(CronSchedule),
}

/// A named unit of maintenance work.
#[derive(Clone)]
pub struct Job {
    name: String,
    trigger: Trigger,
    action: JobAction,
}

impl Job {
    pub(crate) fn new(name: String, trigger: Trigger, action: JobAction) -> Self {
        Self {
            name,
            trigger,
            action,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Invoke the job once.
    ///
    /// The body runs on its own task: a panic is reported as a failure, and
    /// dropping the returned future does not cancel work already started.
    pub async fn run(&self) -> JobOutcome {
        let started = Instant::now();
        let result = match tokio::spawn((self.action)()).await {
            Ok(result) => result.map_err(|e| format!("{e:#}")),
            Err(e) => Err(format!("job task failed: {e}")),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(()) => debug!(job = %self.name, duration_ms, "job completed"),
            Err(e) => error!(job = %self.name, error = %e, duration_ms, "job failed"),
        }

        JobOutcome {
            job: self.name.clone(),
            succeeded: result.is_ok(),
            error: result.err(),
            duration_ms,
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}
