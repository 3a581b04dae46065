use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::api::errors::ApiError;
use crate::api::models::TriggerQuery;
use crate::api::AppState;
use crate::pipeline::{RunOutcome, RunRequest};

/// Run the report now. The run is detached from the request, so it completes
/// and records its outcome even when the client goes away. The run lock is
/// released only after the outcome is stored.
pub async fn trigger_run(
    State(state): State<AppState>,
    Query(query): Query<TriggerQuery>,
) -> Result<(StatusCode, Json<RunOutcome>), ApiError> {
    let guard = state
        .run_lock
        .clone()
        .try_lock_owned()
        .map_err(|_| ApiError::RunInProgress)?;
    info!(date = ?query.date, "Report run triggered over HTTP");

    let orchestrator = state.orchestrator.clone();
    let last_run = state.last_run.clone();
    let request = RunRequest { target_date: query.date };
    let outcome = tokio::spawn(async move {
        let outcome = orchestrator.run(request).await;
        *last_run.write().await = Some(outcome.clone());
        drop(guard);
        outcome
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Report run task failed: {}", e)))?;

    let status = if outcome.is_success() {
        StatusCode::OK
    } else if outcome.is_timeout() {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(outcome)))
}

pub async fn get_last_run(State(state): State<AppState>) -> Result<Json<RunOutcome>, ApiError> {
    state
        .last_run
        .read()
        .await
        .clone()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No run has completed yet".into()))
}
