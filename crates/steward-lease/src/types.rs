//! Lease record type.
//!
//! A lease is a single named row describing which replica currently
//! holds leadership and when it last proved it was alive. All times are
//! whole seconds since the Unix epoch, as observed on the writer's clock.

use serde::{Deserialize, Serialize};

/// Persisted state of one named leadership lease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseRecord {
    /// Lease key. Every replica competing for the same role uses the same name.
    pub name: String,
    /// Identity of the current leader. Empty means unheld.
    pub holder_identity: String,
    /// How long the lease stays valid after `renew_time`.
    pub lease_duration_seconds: i32,
    /// When the current holder first acquired the lease.
    pub acquire_time: i64,
    /// Last time the holder refreshed the lease.
    pub renew_time: i64,
    /// Number of times the lease changed hands.
    pub leader_transitions: i32,
}

impl LeaseRecord {
    /// A record freshly taken by `holder` at `now`.
    pub fn acquired(
        name: impl Into<String>,
        holder: impl Into<String>,
        now: i64,
        lease_duration_seconds: i32,
        leader_transitions: i32,
    ) -> Self {
        Self {
            name: name.into(),
            holder_identity: holder.into(),
            lease_duration_seconds,
            acquire_time: now,
            renew_time: now,
            leader_transitions,
        }
    }

    /// Whether anyone is recorded as holding the lease.
    pub fn is_held(&self) -> bool {
        !self.holder_identity.is_empty()
    }

    /// Whether `identity` is the recorded holder.
    pub fn is_held_by(&self, identity: &str) -> bool {
        self.is_held() && self.holder_identity == identity
    }

    /// Instant (epoch seconds) after which the lease may be taken over.
    pub fn expires_at(&self) -> i64 {
        self.renew_time + i64::from(self.lease_duration_seconds)
    }

    /// A lease is expired once `now` is strictly past `renew_time + duration`.
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at()
    }

    /// Holder as an `Option`, `None` when unheld.
    pub fn holder(&self) -> Option<&str> {
        self.is_held().then_some(self.holder_identity.as_str())
    }
}
