use axum::{extract::State, Json};

use crate::api::models::HealthResponse;
use crate::api::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "costcast",
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH"),
        built_at: option_env!("BUILD_TIMESTAMP"),
        run_in_progress: state.run_lock.try_lock().is_err(),
    })
}
