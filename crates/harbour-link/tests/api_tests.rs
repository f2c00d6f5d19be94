//! Integration tests for the link server endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use harbour_core::config::SimulationBoundsConfig;
use harbour_core::operator::{ObjectCommand, OperatorState};
use harbour_core::sink::ConnectionState;
use harbour_link::router::build_router;
use harbour_link::state::{AppState, CoordinatorSnapshot};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

struct Fixture {
    state: Arc<AppState>,
    operator: Arc<OperatorState>,
    _tx: mpsc::UnboundedSender<String>,
}

fn snapshot() -> CoordinatorSnapshot {
    CoordinatorSnapshot {
        tick: 42,
        simulated_time: NaiveDate::from_ymd_opt(2004, 12, 1)
            .and_then(|d| d.and_hms_opt(6, 30, 0))
            .unwrap(),
        pending_containers: 17,
        transporters_created: 5,
        backlog: 0,
    }
}

fn fixture() -> Fixture {
    let (tx, rx) = mpsc::unbounded_channel();
    let operator = Arc::new(OperatorState::new(&SimulationBoundsConfig::default()));
    let state = AppState::new(Arc::new(ConnectionState::new()), rx, snapshot())
        .with_operator(Arc::clone(&operator));
    Fixture {
        state: Arc::new(state),
        operator,
        _tx: tx,
    }
}

fn bare_state() -> (Arc<AppState>, mpsc::UnboundedSender<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let state = AppState::new(Arc::new(ConnectionState::new()), rx, snapshot());
    (Arc::new(state), tx)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn index_returns_html() {
    let f = fixture();
    let response = build_router(f.state).oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Harbour Coordinator"));
    assert!(html.contains("<td>42</td>"));
}

#[tokio::test]
async fn status_reports_snapshot_and_flags() {
    let f = fixture();
    f.operator.pause();

    let response = build_router(Arc::clone(&f.state))
        .oneshot(get("/api/status"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["tick"], 42);
    assert_eq!(json["simulated_time"], "2004-12-01T06:30:00");
    assert_eq!(json["pending_containers"], 17);
    assert_eq!(json["transporters_created"], 5);
    assert_eq!(json["connected"], false);
    assert_eq!(json["paused"], true);
    assert_eq!(json["tick_interval_ms"], 50);
    assert!(json["end_reason"].is_null());
}

#[tokio::test]
async fn status_reflects_attached_client() {
    let f = fixture();
    f.state.connection.try_connect();

    let json = body_json(
        build_router(Arc::clone(&f.state))
            .oneshot(get("/api/status"))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(json["connected"], true);
    assert_eq!(json["sessions"], 1);
}

#[tokio::test]
async fn status_without_operator_is_unavailable() {
    let (state, _tx) = bare_state();
    let response = build_router(state).oneshot(get("/api/status")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["status"], 503);
}

// ---------------------------------------------------------------------------
// Operator controls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pause_and_resume() {
    let f = fixture();

    let response = build_router(Arc::clone(&f.state))
        .oneshot(post_empty("/api/operator/pause"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(f.operator.is_paused());

    let response = build_router(Arc::clone(&f.state))
        .oneshot(post_empty("/api/operator/resume"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!f.operator.is_paused());
}

#[tokio::test]
async fn stop_sets_flag() {
    let f = fixture();
    let response = build_router(Arc::clone(&f.state))
        .oneshot(post_empty("/api/operator/stop"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(f.operator.is_stop_requested());
}

#[tokio::test]
async fn speed_change_reports_previous_interval() {
    let f = fixture();
    let response = build_router(Arc::clone(&f.state))
        .oneshot(post_json(
            "/api/operator/speed",
            &serde_json::json!({ "tick_interval_ms": 250 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["previous_interval_ms"], 50);
    assert_eq!(json["new_interval_ms"], 250);
    assert_eq!(f.operator.tick_interval_ms(), 250);
}

#[tokio::test]
async fn speed_below_floor_is_rejected() {
    let f = fixture();
    let response = build_router(Arc::clone(&f.state))
        .oneshot(post_json(
            "/api/operator/speed",
            &serde_json::json!({ "tick_interval_ms": 1 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(f.operator.tick_interval_ms(), 50);
}

#[tokio::test]
async fn operator_endpoints_need_operator_state() {
    let (state, _tx) = bare_state();
    let response = build_router(state)
        .oneshot(post_empty("/api/operator/pause"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ---------------------------------------------------------------------------
// Object commands
// ---------------------------------------------------------------------------

#[tokio::test]
async fn move_is_queued_for_next_tick() {
    let f = fixture();
    let response = build_router(Arc::clone(&f.state))
        .oneshot(post_json(
            "/api/operator/move",
            &serde_json::json!({
                "object_name": "truck-7",
                "destination_name": "gate-2",
                "speed": 1.5
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let queued = f.operator.drain_commands().await;
    assert!(matches!(
        queued.as_slice(),
        [ObjectCommand::Move(mv)] if mv.object_name == "truck-7" && mv.destination_name == "gate-2"
    ));
}

#[tokio::test]
async fn move_with_negative_speed_is_rejected() {
    let f = fixture();
    let response = build_router(Arc::clone(&f.state))
        .oneshot(post_json(
            "/api/operator/move",
            &serde_json::json!({
                "object_name": "truck-7",
                "destination_name": "gate-2",
                "speed": -3.0
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(f.operator.drain_commands().await.is_empty());
}

#[tokio::test]
async fn dispose_is_queued_and_blank_names_rejected() {
    let f = fixture();

    let response = build_router(Arc::clone(&f.state))
        .oneshot(post_json(
            "/api/operator/dispose",
            &serde_json::json!({ "object_name": "  " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = build_router(Arc::clone(&f.state))
        .oneshot(post_json(
            "/api/operator/dispose",
            &serde_json::json!({ "object_name": "ship-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let queued = f.operator.drain_commands().await;
    assert!(matches!(
        queued.as_slice(),
        [ObjectCommand::Dispose(d)] if d.object_name == "ship-1"
    ));
}

// ---------------------------------------------------------------------------
// WebSocket endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_client_gets_conflict() {
    let f = fixture();
    assert!(f.state.connection.try_connect());

    let response = build_router(Arc::clone(&f.state))
        .oneshot(get("/ws/visualization"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(f.state.connection.is_connected());
}

#[tokio::test]
async fn plain_get_is_not_upgraded() {
    let f = fixture();
    let response = build_router(Arc::clone(&f.state))
        .oneshot(get("/ws/visualization"))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert_ne!(response.status(), StatusCode::CONFLICT);
    assert!(!f.state.connection.is_connected());
}
