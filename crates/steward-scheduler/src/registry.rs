//! JobRegistry — ordered set of maintenance jobs — and DueTracker, the
//! per-job next-fire bookkeeping used by the leader's tick loop.

use std::future::Future;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{SchedulerError, SchedulerResult};
use crate::job::{CronSchedule, Job, Trigger, boxed_action};

/// Jobs in registration order. Names are unique.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Vec<Job>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job that runs whenever `expr` has an occurrence between
    /// two leader ticks.
    pub fn register_cron_job<F, Fut>(
        &mut self,
        name: impl Into<String>,
        expr: &str,
        action: F,
    ) -> SchedulerResult<&mut Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let schedule = CronSchedule::parse(expr).map_err(|reason| {
            SchedulerError::InvalidSchedule {
                job: name.clone(),
                reason,
            }
        })?;
        self.push(Job::new(name, Trigger::Cron(schedule), boxed_action(action)))
    }

    /// Register a job that runs on every leader tick.
    pub fn register_always_job<F, Fut>(
        &mut self,
        name: impl Into<String>,
        action: F,
    ) -> SchedulerResult<&mut Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.push(Job::new(name.into(), Trigger::Always, boxed_action(action)))
    }

    fn push(&mut self, job: Job) -> SchedulerResult<&mut Self> {
        if self.jobs.iter().any(|j| j.name() == job.name()) {
            return Err(SchedulerError::DuplicateJob(job.name().to_string()));
        }
        debug!(job = %job.name(), trigger = ?job.trigger(), "job registered");
        self.jobs.push(job);
        Ok(self)
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn names(&self) -> Vec<&str> {
        self.jobs.iter().map(Job::name).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Next-fire times for every job of one registry.
///
/// Cron jobs start with their first occurrence after the tracker was
/// created. A cron job is due once `now >= next_fire`; firing moves
/// `next_fire` to the first occurrence after `now`, so missed occurrences
/// collapse into a single run. Always-jobs are due on every check.
#[derive(Debug)]
pub struct DueTracker {
    next_fire: Vec<Option<DateTime<Utc>>>,
}

impl DueTracker {
    pub fn new(registry: &JobRegistry, now: DateTime<Utc>) -> Self {
        let next_fire = registry
            .jobs()
            .iter()
            .map(|job| match job.trigger() {
                Trigger::Always => None,
                Trigger::Cron(schedule) => schedule.next_after(&now),
            })
            .collect();
        Self { next_fire }
    }

    pub fn next_fire(&self, index: usize) -> Option<DateTime<Utc>> {
        self.next_fire.get(index).copied().flatten()
    }

    /// Indices of jobs due at `now`, in registration order. Advances the
    /// next-fire time of every returned cron job.
    pub fn take_due(&mut self, registry: &JobRegistry, now: DateTime<Utc>) -> Vec<usize> {
        let mut due = Vec::new();
        for (index, (job, next)) in registry.jobs().iter().zip(&mut self.next_fire).enumerate() {
            match job.trigger() {
                Trigger::Always => due.push(index),
                Trigger::Cron(schedule) => {
                    if next.is_some_and(|t| now >= t) {
                        *next = schedule.next_after(&now);
                        due.push(index);
                    }
                }
            }
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn noop() -> anyhow::Result<()> {
        Ok(())
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    #[test]
    fn registration_keeps_order() {
        let mut registry = JobRegistry::new();
        registry
            .register_always_job("first", noop)
            .unwrap()
            .register_cron_job("second", "0 0 * * *", noop)
            .unwrap()
            .register_always_job("third", noop)
            .unwrap();
        assert_eq!(registry.names(), vec!["first", "second", "third"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut registry = JobRegistry::new();
        registry.register_always_job("cleanup", noop).unwrap();
        let err = registry
            .register_cron_job("cleanup", "0 * * * *", noop)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateJob(name) if name == "cleanup"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn invalid_cron_names_the_job() {
        let mut registry = JobRegistry::new();
        let err = registry
            .register_cron_job("nightly", "every night", noop)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidSchedule { job, .. } if job == "nightly"));
        assert!(registry.is_empty());
    }

    #[test]
    fn hourly_job_fires_once_per_occurrence() {
        let mut registry = JobRegistry::new();
        registry
            .register_cron_job("hourly", "0 * * * *", noop)
            .unwrap();
        let mut tracker = DueTracker::new(&registry, at(10, 30));
        assert_eq!(tracker.next_fire(0), Some(at(11, 0)));

        assert!(tracker.take_due(&registry, at(10, 45)).is_empty());
        assert_eq!(tracker.take_due(&registry, at(11, 0)), vec![0]);
        assert!(tracker.take_due(&registry, at(11, 5)).is_empty());
        assert_eq!(tracker.next_fire(0), Some(at(12, 0)));
    }

    #[test]
    fn missed_occurrences_collapse_into_one_run() {
        let mut registry = JobRegistry::new();
        registry
            .register_cron_job("hourly", "0 * * * *", noop)
            .unwrap();
        let mut tracker = DueTracker::new(&registry, at(10, 30));

        assert_eq!(tracker.take_due(&registry, at(15, 10)), vec![0]);
        assert_eq!(tracker.next_fire(0), Some(at(16, 0)));
        assert!(tracker.take_due(&registry, at(15, 20)).is_empty());
    }

    #[test]
    fn always_jobs_due_every_check() {
        let mut registry = JobRegistry::new();
        registry
            .register_always_job("a", noop)
            .unwrap()
            .register_cron_job("nightly", "0 0 * * *", noop)
            .unwrap()
            .register_always_job("b", noop)
            .unwrap();
        let mut tracker = DueTracker::new(&registry, at(10, 0));

        assert_eq!(tracker.take_due(&registry, at(10, 10)), vec![0, 2]);
        assert_eq!(tracker.take_due(&registry, at(10, 20)), vec![0, 2]);
        let midnight = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        assert_eq!(tracker.take_due(&registry, midnight), vec![0, 1, 2]);
    }
}
