//! steward-scheduler — leader-gated maintenance jobs.
//!
//! Jobs are registered once at startup, in order, each either on a cron
//! schedule or "always" (every tick). Only the replica holding the lease
//! runs them.
//!
//! # Architecture
//!
//! ```text
//! Scheduler
//!   ├── JobRegistry        ordered jobs (cron | always)
//!   ├── DueTracker         next-fire time per cron job
//!   ├── ElectionRunner     lease renewal loop, is_leader()
//!   └── TriggerConfig      timer mode or endpoint mode
//! ```
//!
//! Two modes:
//!
//! - **timer** (default): `run()` ticks every `tick_interval`; each tick
//!   runs due jobs if this replica leads.
//! - **endpoint**: the timer is off; an external caller triggers
//!   `perform_work()` over HTTP. Without the lease guard this mode does not
//!   consult the lease, so the caller must hit a single replica.

pub mod config;
pub mod error;
pub mod job;
pub mod registry;
pub mod report;
pub mod scheduler;

pub use config::TriggerConfig;
pub use error::{SchedulerError, SchedulerResult};
pub use job::{CronSchedule, Job, JobAction, Trigger};
pub use registry::{DueTracker, JobRegistry};
pub use report::{JobOutcome, RunReport, RunSource};
pub use scheduler::{GuardedRun, Scheduler};
