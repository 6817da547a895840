//! LeaseStore — persistence seam for lease records.
//!
//! The election algorithm only needs three primitives: read a lease by
//! name, create it if absent, and overwrite it. No compare-and-swap is
//! assumed; safety comes from the timing parameters of the elector.
//!
//! `MemoryLeaseStore` is a process-local implementation used by tests and
//! single-node setups. It can be told to fail reads or writes to exercise
//! the elector's failure paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::types::LeaseRecord;

/// Storage for named lease records.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Fetch the lease called `name`, `None` if no row exists.
    async fn get(&self, name: &str) -> StoreResult<Option<LeaseRecord>>;

    /// Insert a new lease row. Fails with `AlreadyExists` if `record.name` is taken.
    async fn create(&self, record: &LeaseRecord) -> StoreResult<LeaseRecord>;

    /// Overwrite every field of an existing lease row.
    async fn update(&self, record: &LeaseRecord) -> StoreResult<()>;
}

#[async_trait]
impl<S: LeaseStore + ?Sized> LeaseStore for Arc<S> {
    async fn get(&self, name: &str) -> StoreResult<Option<LeaseRecord>> {
        (**self).get(name).await
    }

    async fn create(&self, record: &LeaseRecord) -> StoreResult<LeaseRecord> {
        (**self).create(record).await
    }

    async fn update(&self, record: &LeaseRecord) -> StoreResult<()> {
        (**self).update(record).await
    }
}

// ── In-memory store ────────────────────────────────────────────

/// Thread-safe in-memory lease store.
///
/// Clones share the same underlying map, so several electors built from
/// clones of one store compete for the same leases.
#[derive(Clone, Default)]
pub struct MemoryLeaseStore {
    leases: Arc<Mutex<HashMap<String, LeaseRecord>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicU64>,
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get` fail until reset.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `create`/`update` fail until reset.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current copy of a lease, bypassing fault injection.
    pub fn snapshot(&self, name: &str) -> Option<LeaseRecord> {
        self.lock().get(name).cloned()
    }

    /// Number of successful creates and updates so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, LeaseRecord>> {
        // A poisoned map still holds consistent records; every write is a single insert.
        self.leases.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writes(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    async fn get(&self, name: &str) -> StoreResult<Option<LeaseRecord>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(self.lock().get(name).cloned())
    }

    async fn create(&self, record: &LeaseRecord) -> StoreResult<LeaseRecord> {
        self.check_writes()?;
        let mut leases = self.lock();
        if leases.contains_key(&record.name) {
            return Err(StoreError::AlreadyExists(record.name.clone()));
        }
        leases.insert(record.name.clone(), record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!(name = %record.name, holder = %record.holder_identity, "lease created");
        Ok(record.clone())
    }

    async fn update(&self, record: &LeaseRecord) -> StoreResult<()> {
        self.check_writes()?;
        let mut leases = self.lock();
        match leases.get_mut(&record.name) {
            Some(existing) => {
                *existing = record.clone();
                self.writes.fetch_add(1, Ordering::SeqCst);
                debug!(name = %record.name, holder = %record.holder_identity, "lease updated");
                Ok(())
            }
            None => Err(StoreError::NotFound(record.name.clone())),
        }
    }
}
