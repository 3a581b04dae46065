mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::StatusCode;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use common::*;
use costcast::api::{build_router, AppState};

fn app(state: &AppState) -> axum::Router {
    build_router(state.clone())
}

fn state_with(extra: &[(&str, &str)], source: FakeSource) -> AppState {
    let orch = orchestrator(config(extra), Arc::new(source), Arc::new(FakeMessenger::default()));
    AppState::new(Arc::new(orch))
}

fn make_request(method: &str, uri: &str, token: Option<&str>) -> axum::http::Request<Body> {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn response_json(response: axum::http::Response<Body>) -> Value {
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        panic!("Empty response body. Status: {}, Headers: {:?}", parts.status, parts.headers);
    }
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("JSON parse error: {}. Body: {:?}", e, String::from_utf8_lossy(&bytes)))
}

#[tokio::test]
async fn test_health_endpoint() {
    let state = state_with(&[], FakeSource::default());
    let response = app(&state).oneshot(make_request("GET", "/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "costcast");
    assert_eq!(body["run_in_progress"], false);
}

#[tokio::test]
async fn test_trigger_run_success() {
    let state = state_with(&[], reference_source());

    let response = app(&state).oneshot(make_request("POST", "/run", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "done");
    assert_eq!(body["report_date"], "2026-10-14");
    assert_eq!(body["overall_total"], 35.0);
    assert_eq!(body["threads"][0]["project_id"], "B");
    assert_eq!(body["threads"][0]["status"], "sent");

    let response = app(&state).oneshot(make_request("GET", "/runs/last", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "done");
}

#[tokio::test]
async fn test_trigger_with_date_query() {
    let state = state_with(&[], reference_source());
    let response = app(&state)
        .oneshot(make_request("GET", "/run?date=2026-10-13", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["report_date"], "2026-10-13");
    assert_eq!(body["overall_total"], 32.0);
}

#[tokio::test]
async fn test_failed_run_returns_500() {
    let day = date(2026, 10, 14);
    let source = FakeSource::default().with_records(day, vec![
        costcast::models::BillingRecord::new("A", "compute", 1.0, "USD", day),
        costcast::models::BillingRecord::new("B", "compute", 1.0, "JPY", day),
    ]);
    let state = state_with(&[("SEND_FAILURE_ALERTS", "false")], source);

    let response = app(&state).oneshot(make_request("POST", "/run", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert_eq!(body["status"], "failed");
    assert_eq!(body["stage"], "aggregating");
    assert_eq!(body["error_type"], "AggregationError");
}

#[tokio::test]
async fn test_timeout_returns_504() {
    let source = FakeSource {
        delay: Some(Duration::from_secs(5)),
        ..FakeSource::default()
    };
    let state = state_with(&[("RUN_TIMEOUT_SECS", "1"), ("SEND_FAILURE_ALERTS", "false")], source);

    let response = app(&state).oneshot(make_request("POST", "/run", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = response_json(response).await;
    assert_eq!(body["error_type"], "TimeoutError");
}

#[tokio::test]
async fn test_concurrent_trigger_conflicts() {
    let state = state_with(&[], reference_source());
    let _held = state.run_lock.clone().try_lock_owned().unwrap();

    let response = app(&state).oneshot(make_request("POST", "/run", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("already in progress"));

    let response = app(&state).oneshot(make_request("GET", "/health", None)).await.unwrap();
    assert_eq!(response_json(response).await["run_in_progress"], true);
}

#[tokio::test]
async fn test_run_completes_after_client_disconnects() {
    let source = FakeSource {
        delay: Some(Duration::from_millis(400)),
        ..reference_source()
    };
    let messenger = Arc::new(FakeMessenger::default());
    let orch = orchestrator(config(&[]), Arc::new(source), messenger.clone());
    let state = AppState::new(Arc::new(orch));

    // Dropping the response future is what the server does on disconnect
    let abandoned = tokio::time::timeout(
        Duration::from_millis(100),
        app(&state).oneshot(make_request("POST", "/run", None)),
    )
    .await;
    assert!(abandoned.is_err());

    let mut recorded = None;
    for _ in 0..50 {
        let released = state.run_lock.try_lock().is_ok();
        if let Some(outcome) = state.last_run.read().await.clone() {
            if released {
                recorded = Some(outcome);
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let outcome = recorded.expect("run outcome was never recorded");
    assert!(outcome.is_success());
    assert_eq!(messenger.posts().len(), 3);

    let response = app(&state).oneshot(make_request("GET", "/runs/last", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["status"], "done");
}

#[tokio::test]
async fn test_last_run_not_found_before_any_run() {
    let state = state_with(&[], FakeSource::default());
    let response = app(&state).oneshot(make_request("GET", "/runs/last", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trigger_token_enforced() {
    let state = state_with(&[("TRIGGER_TOKEN", "s3cret")], reference_source());

    let response = app(&state).oneshot(make_request("POST", "/run", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app(&state).oneshot(make_request("POST", "/run", Some("wrong"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Invalid trigger token");

    let response = app(&state).oneshot(make_request("POST", "/run", Some("s3cret"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Health stays open
    let response = app(&state).oneshot(make_request("GET", "/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
