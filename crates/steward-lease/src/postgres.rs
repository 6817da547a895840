//! PgLeaseStore — Postgres-backed lease persistence.
//!
//! Every replica of the service points at the same database, so the
//! `leader_election` table is the shared medium the election runs over.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::schema::*;
use crate::store::LeaseStore;
use crate::types::LeaseRecord;

type LeaseRow = (String, String, i32, i64, i64, i32);

fn from_row(row: LeaseRow) -> LeaseRecord {
    let (
        name,
        holder_identity,
        lease_duration_seconds,
        acquire_time,
        renew_time,
        leader_transitions,
    ) = row;
    LeaseRecord {
        name,
        holder_identity,
        lease_duration_seconds,
        acquire_time,
        renew_time,
        leader_transitions,
    }
}

/// Lease store backed by a shared Postgres pool.
#[derive(Clone)]
pub struct PgLeaseStore {
    pool: PgPool,
}

impl PgLeaseStore {
    /// Connect a small pool to `database_url`.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;
        debug!("lease store connected");
        Ok(Self { pool })
    }

    /// Wrap an existing pool, e.g. one shared with the application's jobs.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the `leader_election` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(CREATE_LEADER_ELECTION)
            .execute(&self.pool)
            .await?;
        debug!(table = LEADER_ELECTION_TABLE, "lease schema ready");
        Ok(())
    }
}

#[async_trait]
impl LeaseStore for PgLeaseStore {
    async fn get(&self, name: &str) -> StoreResult<Option<LeaseRecord>> {
        let row: Option<LeaseRow> = sqlx::query_as(SELECT_LEASE)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(from_row))
    }

    async fn create(&self, record: &LeaseRecord) -> StoreResult<LeaseRecord> {
        sqlx::query(INSERT_LEASE)
            .bind(&record.name)
            .bind(&record.holder_identity)
            .bind(record.lease_duration_seconds)
            .bind(record.acquire_time)
            .bind(record.renew_time)
            .bind(record.leader_transitions)
            .execute(&self.pool)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::AlreadyExists(_) => StoreError::AlreadyExists(record.name.clone()),
                other => other,
            })?;
        debug!(name = %record.name, holder = %record.holder_identity, "lease created");
        Ok(record.clone())
    }

    async fn update(&self, record: &LeaseRecord) -> StoreResult<()> {
        let result = sqlx::query(UPDATE_LEASE)
            .bind(&record.name)
            .bind(&record.holder_identity)
            .bind(record.lease_duration_seconds)
            .bind(record.acquire_time)
            .bind(record.renew_time)
            .bind(record.leader_transitions)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(record.name.clone()));
        }
        debug!(name = %record.name, holder = %record.holder_identity, "lease updated");
        Ok(())
    }
}
