//! Read-only REST endpoints.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/status` | Coordinator status as JSON |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use harbour_core::operator::CoordinatorStatus;

use crate::error::LinkError;
use crate::state::AppState;

/// Serve a minimal HTML page showing coordinator status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await.clone();
    let client = if state.connection.is_connected() {
        "connected"
    } else {
        "waiting"
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Harbour Coordinator</title>
    <style>
        body {{ background: #0b1620; color: #d0dde8; font-family: monospace; padding: 2rem; }}
        td {{ padding: 0.2rem 1rem 0.2rem 0; }}
        a {{ color: #5fb3f0; }}
    </style>
</head>
<body>
    <h1>Harbour Coordinator</h1>
    <table>
        <tr><td>Tick</td><td>{tick}</td></tr>
        <tr><td>Simulated time</td><td>{time}</td></tr>
        <tr><td>Pending containers</td><td>{pending}</td></tr>
        <tr><td>Transporters created</td><td>{created}</td></tr>
        <tr><td>Visualization client</td><td>{client}</td></tr>
    </table>
    <p><a href="/api/status">/api/status</a> &middot; <code>/ws/visualization</code></p>
</body>
</html>"#,
        tick = snapshot.tick,
        time = snapshot.simulated_time,
        pending = snapshot.pending_containers,
        created = snapshot.transporters_created,
    ))
}

/// Return the coordinator status: tick, simulated time, pending
/// containers, connection and operator flags.
pub async fn status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, LinkError> {
    let operator = state
        .operator_state
        .as_ref()
        .ok_or(LinkError::OperatorUnavailable)?;

    let snapshot = state.snapshot.read().await.clone();

    Ok(Json(CoordinatorStatus {
        tick: snapshot.tick,
        simulated_time: snapshot.simulated_time,
        pending_containers: snapshot.pending_containers,
        transporters_created: snapshot.transporters_created,
        connected: state.connection.is_connected(),
        paused: operator.is_paused(),
        stop_requested: operator.is_stop_requested(),
        tick_interval_ms: operator.tick_interval_ms(),
        elapsed_seconds: operator.elapsed_seconds(),
        sessions: state.connection.sessions(),
        end_reason: operator.end_reason().await,
    }))
}
