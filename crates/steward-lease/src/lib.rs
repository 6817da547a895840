//! steward-lease — lease records and the stores that persist them.
//!
//! A lease is one named row that says which replica is currently the
//! leader, when it took over, and when it last renewed. Replicas never
//! talk to each other; they only read and write this row.
//!
//! # Architecture
//!
//! ```text
//!   elector ──▶ LeaseStore (trait)
//!                 ├── PgLeaseStore      shared Postgres table `leader_election`
//!                 └── MemoryLeaseStore  process-local map, fault injection for tests
//! ```
//!
//! Stores offer read, create-if-absent, and overwrite. There is no
//! compare-and-swap, so two replicas can race on an overwrite; the
//! election timing parameters bound how long such a race can matter.

pub mod error;
pub mod postgres;
pub mod schema;
pub mod store;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use postgres::PgLeaseStore;
pub use store::{LeaseStore, MemoryLeaseStore};
pub use types::LeaseRecord;
