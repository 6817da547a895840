//! LeaderElector — one acquire-or-renew round against the lease.
//!
//! Each round reads the lease, decides what to write, and writes it:
//!
//! | Lease state                        | Action  | Result   |
//! |------------------------------------|---------|----------|
//! | absent                             | create  | leader   |
//! | held by us                         | renew   | leader   |
//! | held by another, not expired       | nothing | follower |
//! | unheld, or held by another, expired| acquire | leader   |
//!
//! The decision itself is the pure function [`decide`]; the elector only
//! adds I/O around it.

use std::sync::Arc;
use std::time::Duration;

use steward_lease::LeaseRecord;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{ElectionError, ElectionResult};
use crate::identity::Identity;
use crate::lock::ResourceLock;

/// What a candidate should do after reading the lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// No lease exists yet. Create it as the first holder.
    Create(LeaseRecord),
    /// We already hold the lease. Refresh `renew_time`.
    Renew(LeaseRecord),
    /// The lease is free or stale. Take it over.
    Acquire(LeaseRecord),
    /// Someone else holds a live lease, left as read.
    Follow(LeaseRecord),
}

impl Decision {
    /// The record to write, if any.
    pub fn to_write(&self) -> Option<&LeaseRecord> {
        match self {
            Decision::Create(r) | Decision::Renew(r) | Decision::Acquire(r) => Some(r),
            Decision::Follow(_) => None,
        }
    }
}

/// Decide how `identity` should act on `current` at time `now`.
pub fn decide(
    name: &str,
    current: Option<&LeaseRecord>,
    identity: &Identity,
    now: i64,
    lease_duration_secs: i32,
) -> Decision {
    let Some(current) = current else {
        return Decision::Create(LeaseRecord::acquired(
            name,
            identity.as_str(),
            now,
            lease_duration_secs,
            0,
        ));
    };

    if current.is_held_by(identity.as_str()) {
        // renew_time never moves behind acquire_time, even if our clock stepped back.
        return Decision::Renew(LeaseRecord {
            renew_time: now.max(current.acquire_time),
            ..current.clone()
        });
    }

    if current.is_held() && !current.is_expired(now) {
        return Decision::Follow(current.clone());
    }

    Decision::Acquire(LeaseRecord::acquired(
        name,
        identity.as_str(),
        now,
        lease_duration_secs,
        current.leader_transitions + 1,
    ))
}

/// Outcome of one successful round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Created(LeaseRecord),
    Renewed(LeaseRecord),
    Acquired(LeaseRecord),
    Following(LeaseRecord),
}

impl Observation {
    pub fn is_leading(&self) -> bool {
        !matches!(self, Observation::Following(_))
    }

    /// The lease as it stands after this round.
    pub fn record(&self) -> &LeaseRecord {
        match self {
            Observation::Created(r)
            | Observation::Renewed(r)
            | Observation::Acquired(r)
            | Observation::Following(r) => r,
        }
    }

    pub fn holder(&self) -> &str {
        &self.record().holder_identity
    }
}

/// Runs acquire-or-renew rounds for one identity on one lease.
pub struct LeaderElector {
    lock: Arc<dyn ResourceLock>,
    clock: Arc<dyn Clock>,
    lease_duration_secs: i32,
}

impl LeaderElector {
    pub fn new(
        lock: Arc<dyn ResourceLock>,
        clock: Arc<dyn Clock>,
        lease_duration: Duration,
    ) -> ElectionResult<Self> {
        let lease_duration_secs = i32::try_from(lease_duration.as_secs())
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                ElectionError::InvalidConfig(format!(
                    "lease duration {lease_duration:?} out of range"
                ))
            })?;
        Ok(Self {
            lock,
            clock,
            lease_duration_secs,
        })
    }

    pub fn identity(&self) -> &Identity {
        self.lock.identity()
    }

    pub fn lease_name(&self) -> &str {
        self.lock.lease_name()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Read the lease without writing anything.
    pub async fn observe(&self) -> ElectionResult<Option<LeaseRecord>> {
        Ok(self.lock.get().await?)
    }

    /// One round of the election. Errors leave the lease untouched as far
    /// as this replica knows; the caller treats them as a failed renewal.
    pub async fn try_acquire_or_renew(&self) -> ElectionResult<Observation> {
        let current = self.lock.get().await?;
        let now = self.clock.now();
        let decision = decide(
            self.lock.lease_name(),
            current.as_ref(),
            self.lock.identity(),
            now,
            self.lease_duration_secs,
        );

        match decision {
            Decision::Create(record) => {
                let record = self.lock.create(record).await?;
                self.lock
                    .record_event(&format!("{} became leader", self.identity()));
                Ok(Observation::Created(record))
            }
            Decision::Renew(record) => {
                self.lock.update(record.clone()).await?;
                debug!(lease = %record.name, renew_time = record.renew_time, "lease renewed");
                Ok(Observation::Renewed(record))
            }
            Decision::Acquire(record) => {
                self.lock.update(record.clone()).await?;
                info!(
                    lease = %record.name,
                    previous = current.as_ref().map_or("", |c| c.holder_identity.as_str()),
                    transitions = record.leader_transitions,
                    "lease taken over"
                );
                self.lock
                    .record_event(&format!("{} became leader", self.identity()));
                Ok(Observation::Acquired(record))
            }
            Decision::Follow(record) => {
                debug!(
                    holder = %record.holder_identity,
                    expires_at = record.expires_at(),
                    "lease held by another replica"
                );
                Ok(Observation::Following(record))
            }
        }
    }

    /// Give the lease up if we hold it: clear the holder and shrink the
    /// duration to one second. Returns whether anything was written.
    pub async fn release(&self) -> ElectionResult<bool> {
        let Some(current) = self.lock.get().await? else {
            return Ok(false);
        };
        if !current.is_held_by(self.identity().as_str()) {
            return Ok(false);
        }

        let now = self.clock.now();
        let released = LeaseRecord {
            holder_identity: String::new(),
            lease_duration_seconds: 1,
            acquire_time: now,
            renew_time: now,
            ..current
        };
        self.lock.update(released).await?;
        self.lock
            .record_event(&format!("{} stopped leading", self.identity()));
        Ok(true)
    }
}
