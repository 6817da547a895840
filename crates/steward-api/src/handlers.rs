//! REST API handlers.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::Serialize;
use steward_election::LeaderStatus;
use steward_scheduler::{GuardedRun, RunReport};
use tracing::{info, warn};

use crate::ApiState;

/// Header carrying the shared secret on schedule triggers.
pub const SCHEDULER_SECRET_HEADER: &str = "x-steward-scheduler-secret";

/// Header name used by older deployments' cron callers. Still accepted.
pub const LEGACY_SCHEDULER_SECRET_HEADER: &str = "x-flattrack-scheduler-secret";

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn secret_from(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SCHEDULER_SECRET_HEADER)
        .or_else(|| headers.get(LEGACY_SCHEDULER_SECRET_HEADER))
        .and_then(|v| v.to_str().ok())
}

/// Compare without short-circuiting on the first differing byte.
fn secrets_match(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    !expected.is_empty()
        && given.len() == expected.len()
        && given
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

// ── Scheduler ──────────────────────────────────────────────────

/// POST /api/system/schedule
pub async fn trigger_schedule(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let scheduler = &state.scheduler;
    if !scheduler.is_endpoint_trigger_enabled() {
        return error_response("scheduler endpoint is disabled", StatusCode::NOT_FOUND)
            .into_response();
    }

    let authorized = secret_from(&headers)
        .is_some_and(|given| secrets_match(given, scheduler.endpoint_secret()));
    if !authorized {
        warn!("schedule trigger rejected: secret mismatch");
        return error_response("unauthorized", StatusCode::UNAUTHORIZED).into_response();
    }

    info!("schedule trigger accepted");
    match scheduler.run_guarded_work().await {
        Ok(GuardedRun::Completed(report)) => ApiResponse::ok(report).into_response(),
        Ok(GuardedRun::NotLeader { holder }) => error_response(
            &format!(
                "lease held by another replica: {}",
                holder.as_deref().unwrap_or("unknown")
            ),
            StatusCode::CONFLICT,
        )
        .into_response(),
        Err(e) => error_response(
            &format!("failed to run work: {e}"),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .into_response(),
    }
}

/// Read-only view of the election and the last run.
#[derive(Debug, Serialize)]
pub struct SchedulerStatus {
    pub mode: &'static str,
    pub trigger_lease_guard: bool,
    pub election: LeaderStatus,
    pub leading: bool,
    pub jobs: Vec<String>,
    pub last_run: Option<RunReport>,
}

/// GET /api/system/scheduler
pub async fn scheduler_status(State(state): State<ApiState>) -> impl IntoResponse {
    let scheduler = &state.scheduler;
    let election = scheduler.election();
    ApiResponse::ok(SchedulerStatus {
        mode: if scheduler.is_endpoint_trigger_enabled() {
            "endpoint"
        } else {
            "timer"
        },
        trigger_lease_guard: scheduler.trigger_lease_guard(),
        election: election.status(),
        leading: election.is_leader(),
        jobs: scheduler
            .registry()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        last_run: scheduler.last_run(),
    })
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    ApiResponse::ok("ok")
}
