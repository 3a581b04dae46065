use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api;
use crate::cli::commands::ServeArgs;
use crate::config;
use crate::errors::ReportError;

pub async fn handle_serve(args: ServeArgs) -> Result<i32, ReportError> {
    let orchestrator = match super::prepare(config::load_from_env(), false) {
        Ok(orchestrator) => Arc::new(orchestrator),
        Err(outcome) => return Ok(outcome.exit_code),
    };
    if orchestrator.config().trigger_token.is_none() {
        warn!("TRIGGER_TOKEN is not set; /run accepts unauthenticated requests");
    }

    let state = api::AppState::new(orchestrator);
    let app = api::build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| ReportError::Internal(format!("Server error: {}", e)))?;

    info!("Server stopped");
    Ok(0)
}

async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received; finishing in-flight requests");
    shutdown.cancel();
}
