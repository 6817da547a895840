//! Postgres lease store tests.
//!
//! These need a live database and are ignored by default. Run with:
//!
//! ```text
//! STEWARD_TEST_DATABASE_URL=postgres://... cargo test -p steward-lease -- --ignored
//! ```

use steward_lease::*;

async fn test_store(lease: &str) -> PgLeaseStore {
    let url = std::env::var("STEWARD_TEST_DATABASE_URL")
        .expect("STEWARD_TEST_DATABASE_URL must be set for Postgres tests");
    let store = PgLeaseStore::connect(&url).await.unwrap();
    store.ensure_schema().await.unwrap();
    sqlx::query("DELETE FROM leader_election WHERE name = $1")
        .bind(lease)
        .execute(store.pool())
        .await
        .unwrap();
    store
}

#[tokio::test]
#[ignore]
async fn pg_create_get_update() {
    let store = test_store("pg-create-get-update").await;
    assert_eq!(store.get("pg-create-get-update").await.unwrap(), None);

    let record = LeaseRecord::acquired("pg-create-get-update", "abcde", 1_700_000_000, 15, 0);
    store.create(&record).await.unwrap();
    assert_eq!(store.get("pg-create-get-update").await.unwrap(), Some(record.clone()));

    let renewed = LeaseRecord {
        renew_time: record.renew_time + 2,
        ..record
    };
    store.update(&renewed).await.unwrap();
    assert_eq!(store.get("pg-create-get-update").await.unwrap(), Some(renewed));
}

#[tokio::test]
#[ignore]
async fn pg_duplicate_create_is_already_exists() {
    let store = test_store("pg-duplicate").await;
    let record = LeaseRecord::acquired("pg-duplicate", "abcde", 1_700_000_000, 15, 0);
    store.create(&record).await.unwrap();

    let err = store.create(&record).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(name) if name == "pg-duplicate"));
}

#[tokio::test]
#[ignore]
async fn pg_update_missing_is_not_found() {
    let store = test_store("pg-missing").await;
    let record = LeaseRecord::acquired("pg-missing", "abcde", 1_700_000_000, 15, 0);
    assert!(matches!(
        store.update(&record).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore]
async fn pg_ensure_schema_is_idempotent() {
    let store = test_store("pg-schema").await;
    store.ensure_schema().await.unwrap();
    store.ensure_schema().await.unwrap();
}
