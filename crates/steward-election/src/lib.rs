//! steward-election — lease-based leader election.
//!
//! Replicas of a service compete for a single named lease in a shared
//! store. Whoever holds an unexpired lease is the leader; everyone else
//! follows and waits for the lease to lapse.
//!
//! # Architecture
//!
//! ```text
//!   ElectionRunner        retry loop, leader state, callbacks
//!        │
//!   LeaderElector         one acquire-or-renew round, release
//!        │
//!   ResourceLock          (lease name, identity) bound to a store
//!        │
//!   steward_lease::LeaseStore
//! ```
//!
//! Timing follows the usual lease rules: `lease_duration` (15s) >
//! `renew_deadline` (10s) > `retry_period` (2s). A leader that cannot
//! renew within the deadline stops acting before anyone else can take
//! the lease over.

pub mod clock;
pub mod config;
pub mod elector;
pub mod error;
pub mod identity;
pub mod lock;
pub mod runner;

pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock};
pub use config::ElectionConfig;
pub use elector::{Decision, LeaderElector, Observation, decide};
pub use error::{ElectionError, ElectionResult};
pub use identity::Identity;
pub use lock::{ResourceLock, StoreLock};
pub use runner::{ElectionRunner, LeaderCallbacks, LeaderState, LeaderStatus};
