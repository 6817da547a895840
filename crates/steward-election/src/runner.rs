//! ElectionRunner — keeps one replica participating in the election.
//!
//! Every `retry_period` the runner performs one acquire-or-renew round,
//! bounded by `renew_deadline`. The result drives a small state machine:
//!
//! ```text
//!   Unknown ──▶ Follower ◀──▶ Leader
//! ```
//!
//! A leader steps down as soon as it sees another holder, or when it has
//! gone `renew_deadline` without a successful renewal. `is_leader()` also
//! applies the deadline on read, so a stalled loop cannot keep reporting
//! leadership.
//!
//! Current state is published on a `watch` channel; callers either poll
//! `is_leader()` or `subscribe()` for changes.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use steward_lease::LeaseRecord;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::ElectionConfig;
use crate::elector::{LeaderElector, Observation};
use crate::error::{ElectionError, ElectionResult};
use crate::identity::Identity;
use crate::lock::ResourceLock;

/// This replica's view of its own role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderState {
    Unknown,
    Follower,
    Leader,
}

/// Snapshot published after every round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderStatus {
    pub identity: String,
    pub lease_name: String,
    pub state: LeaderState,
    /// Last holder observed in the lease, `None` if unheld or never read.
    pub holder: Option<String>,
    /// Last lease record read or written.
    pub lease: Option<LeaseRecord>,
    #[serde(skip)]
    pub renewed_at: Option<Instant>,
}

type Callback = Arc<dyn Fn() + Send + Sync>;
type LeaderCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Hooks invoked on leadership changes. All are optional.
#[derive(Clone, Default)]
pub struct LeaderCallbacks {
    started_leading: Option<Callback>,
    stopped_leading: Option<Callback>,
    new_leader: Option<LeaderCallback>,
}

impl LeaderCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when this replica becomes leader.
    pub fn on_started_leading(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.started_leading = Some(Arc::new(f));
        self
    }

    /// Called when this replica stops being leader, including at shutdown.
    pub fn on_stopped_leading(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.stopped_leading = Some(Arc::new(f));
        self
    }

    /// Called once per change of holder to some other identity.
    pub fn on_new_leader(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.new_leader = Some(Arc::new(f));
        self
    }
}

/// Drives the election for one replica and exposes its current role.
pub struct ElectionRunner {
    elector: LeaderElector,
    config: ElectionConfig,
    callbacks: LeaderCallbacks,
    status: watch::Sender<LeaderStatus>,
}

impl ElectionRunner {
    pub fn new(
        config: ElectionConfig,
        lock: Arc<dyn ResourceLock>,
        clock: Arc<dyn Clock>,
        callbacks: LeaderCallbacks,
    ) -> ElectionResult<Self> {
        config.validate()?;
        let status = LeaderStatus {
            identity: lock.identity().to_string(),
            lease_name: lock.lease_name().to_string(),
            state: LeaderState::Unknown,
            holder: None,
            lease: None,
            renewed_at: None,
        };
        let elector = LeaderElector::new(lock, clock, config.lease_duration())?;
        Ok(Self {
            elector,
            config,
            callbacks,
            status: watch::Sender::new(status),
        })
    }

    pub fn elector(&self) -> &LeaderElector {
        &self.elector
    }

    pub fn config(&self) -> &ElectionConfig {
        &self.config
    }

    pub fn identity(&self) -> &Identity {
        self.elector.identity()
    }

    pub fn status(&self) -> LeaderStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> LeaderState {
        self.status.borrow().state
    }

    pub fn current_holder(&self) -> Option<String> {
        self.status.borrow().holder.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LeaderStatus> {
        self.status.subscribe()
    }

    /// Leader state and a successful renewal within `renew_deadline`.
    pub fn is_leader(&self) -> bool {
        let deadline = self.config.renew_deadline();
        let status = self.status.borrow();
        status.state == LeaderState::Leader
            && status
                .renewed_at
                .is_some_and(|at| at.elapsed() < deadline)
    }

    /// Run `action` only if this replica currently leads.
    ///
    /// Leadership is checked once, before the action starts. Losing the
    /// lease while the action runs does not interrupt it.
    pub async fn run_while_leading<F, Fut>(&self, action: F) -> Option<Fut::Output>
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        if !self.is_leader() {
            return None;
        }
        Some(action().await)
    }

    /// Participate in the election until `shutdown` flips, then step down
    /// and, if configured, release the lease.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            identity = %self.identity(),
            lease = %self.elector.lease_name(),
            retry_period = ?self.config.retry_period(),
            "leader election started"
        );

        let mut interval = tokio::time::interval(self.config.retry_period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {
                    let _ = self.step().await;
                }
                _ = shutdown.changed() => {
                    info!("leader election shutting down");
                    break;
                }
            }
        }

        self.stop().await;
    }

    /// One bounded election round, applied to this runner's state.
    pub async fn step(&self) -> ElectionResult<Observation> {
        let deadline = self.config.renew_deadline();
        let result = match tokio::time::timeout(deadline, self.elector.try_acquire_or_renew()).await
        {
            Ok(result) => result,
            Err(_) => Err(ElectionError::Timeout(deadline)),
        };

        match &result {
            Ok(observation) => self.observe(observation),
            Err(e) => {
                warn!(error = %e, "failed to acquire or renew lease");
                self.observe_failure();
            }
        }
        result
    }

    fn observe(&self, observation: &Observation) {
        let identity = self.identity().as_str();
        let record = observation.record();
        let holder = record.holder().map(str::to_string);

        let mut started = false;
        let mut stopped = false;
        let mut new_leader = None;
        self.status.send_modify(|status| {
            let was_leader = status.state == LeaderState::Leader;
            if holder != status.holder {
                new_leader = holder.clone().filter(|h| h != identity);
            }
            if observation.is_leading() {
                started = !was_leader;
                status.state = LeaderState::Leader;
                status.renewed_at = Some(Instant::now());
            } else {
                stopped = was_leader;
                status.state = LeaderState::Follower;
            }
            status.holder = holder.clone();
            status.lease = Some(record.clone());
        });

        if stopped {
            info!(holder = ?holder, "lease held by another replica, stopped leading");
            self.fire_stopped();
        }
        if started {
            info!(identity, transitions = record.leader_transitions, "started leading");
            if let Some(cb) = &self.callbacks.started_leading {
                cb();
            }
        }
        if let Some(leader) = new_leader {
            info!(%leader, "new leader observed");
            if let Some(cb) = &self.callbacks.new_leader {
                cb(&leader);
            }
        }
    }

    fn observe_failure(&self) {
        let deadline = self.config.renew_deadline();
        let mut stopped = false;
        self.status.send_modify(|status| match status.state {
            LeaderState::Leader => {
                if status.renewed_at.is_none_or(|at| at.elapsed() >= deadline) {
                    status.state = LeaderState::Follower;
                    stopped = true;
                }
            }
            LeaderState::Unknown => status.state = LeaderState::Follower,
            LeaderState::Follower => {}
        });

        if stopped {
            warn!(?deadline, "no successful renewal within deadline, stopped leading");
            self.fire_stopped();
        }
    }

    fn fire_stopped(&self) {
        if let Some(cb) = &self.callbacks.stopped_leading {
            cb();
        }
    }

    async fn stop(&self) {
        let was_leader = self.state() == LeaderState::Leader;
        self.status.send_modify(|status| {
            status.state = LeaderState::Follower;
            status.renewed_at = None;
        });
        if !was_leader {
            return;
        }

        info!("stopped leading");
        self.fire_stopped();

        if !self.config.release_on_cancel {
            return;
        }
        match tokio::time::timeout(self.config.renew_deadline(), self.elector.release()).await {
            Ok(Ok(true)) => {
                info!(lease = %self.elector.lease_name(), "lease released");
                self.status.send_modify(|status| status.holder = None);
            }
            Ok(Ok(false)) => debug!("lease no longer ours, nothing to release"),
            Ok(Err(e)) => warn!(error = %e, "failed to release lease"),
            Err(_) => warn!("timed out releasing lease"),
        }
    }
}
