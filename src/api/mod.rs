pub mod routes;
pub mod models;
pub mod errors;
pub mod auth;

use std::sync::Arc;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;

use crate::pipeline::{ReportOrchestrator, RunOutcome};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ReportOrchestrator>,
    pub last_run: Arc<RwLock<Option<RunOutcome>>>,
    /// Held for the duration of a run; a second trigger gets 409.
    pub run_lock: Arc<Mutex<()>>,
    pub trigger_token: Option<String>,
}

impl AppState {
    pub fn new(orchestrator: Arc<ReportOrchestrator>) -> Self {
        let trigger_token = orchestrator.config().trigger_token.clone();
        Self {
            orchestrator,
            last_run: Arc::new(RwLock::new(None)),
            run_lock: Arc::new(Mutex::new(())),
            trigger_token,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/run", get(routes::runs::trigger_run).post(routes::runs::trigger_run))
        .route("/runs/last", get(routes::runs::get_last_run))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::trigger_auth));

    Router::new()
        .merge(protected)
        .route("/health", get(routes::health::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
