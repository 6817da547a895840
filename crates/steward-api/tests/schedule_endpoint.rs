//! Schedule endpoint tests.
//!
//! Drive the full router with `oneshot` against an in-memory lease store
//! and spy jobs that count their invocations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use steward_api::build_router;
use steward_election::*;
use steward_lease::{LeaseRecord, LeaseStore, MemoryLeaseStore};
use steward_scheduler::{JobRegistry, Scheduler, TriggerConfig};
use tower::ServiceExt;

const SECRET: &str = "s3cret";

struct Harness {
    store: MemoryLeaseStore,
    calls: Arc<AtomicUsize>,
    router: axum::Router,
}

fn harness(config: TriggerConfig, failing_job: bool) -> Harness {
    let store = MemoryLeaseStore::new();
    let lock = StoreLock::new("default", Identity::new("aaaaa"), Arc::new(store.clone()));
    let election = ElectionRunner::new(
        ElectionConfig::default(),
        Arc::new(lock),
        Arc::new(SystemClock),
        LeaderCallbacks::new(),
    )
    .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = JobRegistry::new();
    let spy = calls.clone();
    registry
        .register_always_job("spy", move || {
            let spy = spy.clone();
            async move {
                spy.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .unwrap();
    if failing_job {
        registry
            .register_cron_job("broken", "0 0 * * *", || async {
                Err::<(), _>(anyhow::anyhow!("relation \"shopping_list\" does not exist"))
            })
            .unwrap();
    }

    let scheduler = Scheduler::new(registry, Arc::new(election), config).unwrap();
    Harness {
        store,
        calls,
        router: build_router(Arc::new(scheduler)),
    }
}

fn endpoint_mode() -> TriggerConfig {
    TriggerConfig {
        endpoint_trigger: true,
        endpoint_secret: SECRET.to_string(),
        ..Default::default()
    }
}

fn trigger(secret: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method("POST").uri("/api/system/schedule");
    if let Some(secret) = secret {
        req = req.header("X-Steward-Scheduler-Secret", secret);
    }
    req.body(Body::empty()).unwrap()
}

async fn json(resp: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn wrong_secret_is_unauthorized_and_runs_nothing() {
    let h = harness(endpoint_mode(), false);

    let resp = h.router.clone().oneshot(trigger(Some("guess"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());

    let resp = h.router.oneshot(trigger(None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn disabled_endpoint_is_not_found_even_with_secret() {
    let config = TriggerConfig {
        endpoint_secret: SECRET.to_string(),
        ..Default::default()
    };
    let h = harness(config, false);

    let resp = h.router.oneshot(trigger(Some(SECRET))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn correct_secret_runs_every_job_once() {
    let h = harness(endpoint_mode(), false);

    let resp = h.router.clone().oneshot(trigger(Some(SECRET))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["source"], "endpoint");
    assert_eq!(body["data"]["jobs"][0]["job"], "spy");
    assert_eq!(body["data"]["jobs"][0]["succeeded"], true);
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);

    // No lease guard: the endpoint never touches the lease.
    assert!(h.store.snapshot("default").is_none());

    let req = Request::builder()
        .uri("/api/system/scheduler")
        .body(Body::empty())
        .unwrap();
    let body = json(h.router.oneshot(req).await.unwrap()).await;
    assert_eq!(body["data"]["mode"], "endpoint");
    assert_eq!(body["data"]["last_run"]["source"], "endpoint");
    assert_eq!(body["data"]["jobs"], serde_json::json!(["spy"]));
}

#[tokio::test]
async fn failing_job_is_server_error_after_all_jobs_ran() {
    let h = harness(endpoint_mode(), true);

    let resp = h.router.oneshot(trigger(Some(SECRET))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("broken"));
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn lease_guard_refuses_when_another_replica_leads() {
    let config = TriggerConfig {
        trigger_lease_guard: true,
        ..endpoint_mode()
    };
    let h = harness(config, false);
    let far_future = SystemClock.now() + 3_600;
    h.store
        .create(&LeaseRecord::acquired("default", "zzzzz", far_future, 15, 0))
        .await
        .unwrap();

    let resp = h.router.oneshot(trigger(Some(SECRET))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(json(resp).await["error"].as_str().unwrap().contains("zzzzz"));
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn lease_guard_runs_when_lease_is_free() {
    let config = TriggerConfig {
        trigger_lease_guard: true,
        ..endpoint_mode()
    };
    let h = harness(config, false);

    let resp = h.router.oneshot(trigger(Some(SECRET))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.snapshot("default").unwrap().holder_identity, "aaaaa");
}

#[tokio::test]
async fn healthz_ok() {
    let h = harness(TriggerConfig::default(), false);
    let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let resp = h.router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json(resp).await["data"], "ok");
}
