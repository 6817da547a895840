//! ResourceLock — the elector's view of one named lease.
//!
//! Binds a lease name and this replica's identity to a store so the
//! election logic never handles either directly.

use std::sync::Arc;

use async_trait::async_trait;
use steward_lease::{LeaseRecord, LeaseStore, StoreResult};
use tracing::info;

use crate::identity::Identity;

/// A single lease as seen by one candidate.
#[async_trait]
pub trait ResourceLock: Send + Sync {
    /// Current lease record, `None` if it was never created.
    async fn get(&self) -> StoreResult<Option<LeaseRecord>>;

    /// Create the lease. Fails if another candidate created it first.
    async fn create(&self, record: LeaseRecord) -> StoreResult<LeaseRecord>;

    /// Overwrite the lease.
    async fn update(&self, record: LeaseRecord) -> StoreResult<()>;

    /// Name of the lease row this lock guards.
    fn lease_name(&self) -> &str;

    /// Identity this lock writes as.
    fn identity(&self) -> &Identity;

    /// Human-readable lock description for logs.
    fn describe(&self) -> String;

    /// Record a leadership event (became leader, stopped leading).
    fn record_event(&self, event: &str);
}

/// `ResourceLock` over a `LeaseStore` row.
#[derive(Clone)]
pub struct StoreLock {
    name: String,
    identity: Identity,
    store: Arc<dyn LeaseStore>,
}

impl StoreLock {
    pub fn new(name: impl Into<String>, identity: Identity, store: Arc<dyn LeaseStore>) -> Self {
        Self {
            name: name.into(),
            identity,
            store,
        }
    }
}

#[async_trait]
impl ResourceLock for StoreLock {
    async fn get(&self) -> StoreResult<Option<LeaseRecord>> {
        self.store.get(&self.name).await
    }

    async fn create(&self, record: LeaseRecord) -> StoreResult<LeaseRecord> {
        self.store.create(&record).await
    }

    async fn update(&self, record: LeaseRecord) -> StoreResult<()> {
        self.store.update(&record).await
    }

    fn lease_name(&self) -> &str {
        &self.name
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn describe(&self) -> String {
        format!("leader_election/{}", self.name)
    }

    fn record_event(&self, event: &str) {
        info!(lock = %self.describe(), identity = %self.identity, event, "leader election event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_lease::MemoryLeaseStore;

    #[tokio::test]
    async fn store_lock_reads_its_own_lease() {
        let store = MemoryLeaseStore::new();
        store
            .create(&LeaseRecord::acquired("other", "zzzzz", 1, 15, 0))
            .await
            .unwrap();

        let lock = StoreLock::new("default", Identity::new("abcde"), Arc::new(store.clone()));
        assert_eq!(lock.get().await.unwrap(), None);

        lock.create(LeaseRecord::acquired("default", "abcde", 1, 15, 0))
            .await
            .unwrap();
        assert_eq!(lock.get().await.unwrap().unwrap().holder_identity, "abcde");
        assert_eq!(lock.describe(), "leader_election/default");
        assert_eq!(lock.identity().as_str(), "abcde");
    }
}
