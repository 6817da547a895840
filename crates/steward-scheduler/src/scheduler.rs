//! Scheduler — runs registered jobs from exactly one replica at a time.
//!
//! In timer mode `run()` drives two independent loops: the election runner
//! (every `retry_period`) and the tick loop (every `tick_interval`). The
//! tick loop checks leadership on each tick and, only while leading, runs
//! the jobs that are due. The loops do not wait on each other: a slow job
//! never delays a renewal, and losing the lease does not stop a job that
//! already started. Jobs must therefore tolerate running more than once.
//!
//! In endpoint mode the internal timer is off and work runs only through
//! `perform_work()` / `run_guarded_work()`, called by the HTTP layer.

use std::sync::Arc;

use chrono::Utc;
use steward_election::ElectionRunner;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::TriggerConfig;
use crate::error::{SchedulerError, SchedulerResult};
use crate::job::Job;
use crate::registry::{DueTracker, JobRegistry};
use crate::report::{RunReport, RunSource};

/// Outcome of an endpoint trigger when the lease guard may refuse it.
#[derive(Debug, Clone)]
pub enum GuardedRun {
    Completed(RunReport),
    /// Another replica holds the lease; nothing ran.
    NotLeader { holder: Option<String> },
}

pub struct Scheduler {
    registry: JobRegistry,
    config: TriggerConfig,
    election: Arc<ElectionRunner>,
    last_run: watch::Sender<Option<RunReport>>,
}

impl Scheduler {
    pub fn new(
        registry: JobRegistry,
        election: Arc<ElectionRunner>,
        config: TriggerConfig,
    ) -> SchedulerResult<Self> {
        config.validate()?;
        Ok(Self {
            registry,
            config,
            election,
            last_run: watch::Sender::new(None),
        })
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn election(&self) -> &Arc<ElectionRunner> {
        &self.election
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn is_endpoint_trigger_enabled(&self) -> bool {
        self.config.endpoint_trigger
    }

    pub fn endpoint_secret(&self) -> &str {
        &self.config.endpoint_secret
    }

    pub fn trigger_lease_guard(&self) -> bool {
        self.config.trigger_lease_guard
    }

    /// Most recent tick or endpoint run, if any.
    pub fn last_run(&self) -> Option<RunReport> {
        self.last_run.borrow().clone()
    }

    /// Run until `shutdown` flips. Returns immediately in endpoint mode.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) {
        if self.config.endpoint_trigger {
            info!("internal timer disabled, jobs run through the schedule endpoint");
            return;
        }

        let election = self.election.clone();
        let election_shutdown = shutdown.clone();
        let election_task = tokio::spawn(async move { election.run(election_shutdown).await });

        self.tick_loop(shutdown).await;

        if let Err(e) = election_task.await {
            warn!(error = %e, "election task ended abnormally");
        }
    }

    async fn tick_loop(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            jobs = self.registry.len(),
            interval = ?self.config.tick_interval(),
            "scheduler tick loop started"
        );
        let mut tracker = DueTracker::new(&self.registry, Utc::now());
        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; give the election a round first.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.leader_tick(&mut tracker, Utc::now()).await;
                }
                _ = shutdown.changed() => {
                    info!("scheduler tick loop shutting down");
                    break;
                }
            }
        }
    }

    /// One tick of the timer loop. Followers still consume due occurrences
    /// so that winning the lease later does not replay what the previous
    /// leader already ran.
    async fn leader_tick(
        &self,
        tracker: &mut DueTracker,
        now: chrono::DateTime<Utc>,
    ) -> Option<RunReport> {
        let ran = self
            .election
            .run_while_leading(|| self.tick(tracker, now))
            .await;
        match ran {
            Some(Some(report)) => {
                debug!(jobs = report.jobs.len(), "tick complete");
                Some(report)
            }
            Some(None) => {
                debug!("tick: nothing due");
                None
            }
            None => {
                let skipped = tracker.take_due(&self.registry, now);
                debug!(
                    holder = ?self.election.current_holder(),
                    skipped = skipped.len(),
                    "not leading, skipping tick"
                );
                None
            }
        }
    }

    /// Run every job due at `now`, in registration order. `None` if nothing
    /// was due. Individual failures are logged and recorded in the report.
    pub async fn tick(
        &self,
        tracker: &mut DueTracker,
        now: chrono::DateTime<Utc>,
    ) -> Option<RunReport> {
        let due: Vec<&Job> = tracker
            .take_due(&self.registry, now)
            .into_iter()
            .filter_map(|i| self.registry.jobs().get(i))
            .collect();
        if due.is_empty() {
            return None;
        }
        Some(self.execute(RunSource::Tick, due).await)
    }

    /// Run every registered job once, in order, regardless of schedule or
    /// leadership. Fails with `JobsFailed` if any job failed, after all ran.
    pub async fn perform_work(&self) -> SchedulerResult<RunReport> {
        info!(jobs = self.registry.len(), "performing scheduled work");
        let report = self
            .execute(RunSource::Endpoint, self.registry.jobs().iter().collect())
            .await;
        if report.is_success() {
            Ok(report)
        } else {
            Err(SchedulerError::JobsFailed {
                failed: report.failed_jobs(),
                report: Box::new(report),
            })
        }
    }

    /// `perform_work()` behind the lease guard, when enabled: run one
    /// election round first and only proceed if this replica leads.
    pub async fn run_guarded_work(&self) -> SchedulerResult<GuardedRun> {
        if self.config.trigger_lease_guard {
            let observation = self.election.step().await?;
            if !observation.is_leading() {
                let holder = observation.record().holder().map(str::to_string);
                info!(holder = ?holder, "lease held elsewhere, refusing endpoint trigger");
                return Ok(GuardedRun::NotLeader { holder });
            }
        }
        self.perform_work().await.map(GuardedRun::Completed)
    }

    async fn execute(&self, source: RunSource, jobs: Vec<&Job>) -> RunReport {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(jobs.len());
        for job in jobs {
            outcomes.push(job.run().await);
        }
        let report = RunReport {
            source,
            started_at,
            finished_at: Utc::now(),
            jobs: outcomes,
        };
        if !report.is_success() {
            warn!(source = ?source, failed = ?report.failed_jobs(), "scheduling errors");
        }
        self.last_run.send_replace(Some(report.clone()));
        report
    }
}
