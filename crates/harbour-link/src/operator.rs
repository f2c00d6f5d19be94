//! Operator REST API handlers for runtime coordinator control.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/operator/pause` | Pause the tick loop |
//! | `POST` | `/api/operator/resume` | Resume the tick loop |
//! | `POST` | `/api/operator/speed` | Set tick interval (ms) |
//! | `POST` | `/api/operator/move` | Queue a Move for the visualization |
//! | `POST` | `/api/operator/dispose` | Queue a Dispose for the visualization |
//! | `POST` | `/api/operator/stop` | Trigger clean shutdown |
//!
//! Move and Dispose are not written to the socket here. They are queued
//! on the [`OperatorState`] and sent by the tick loop after the next
//! tick's create messages.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use harbour_core::operator::{MIN_TICK_INTERVAL_MS, ObjectCommand, OperatorState};
use harbour_types::{DisposeMessage, MoveMessage};

use crate::error::LinkError;
use crate::state::AppState;

/// Request body for `POST /api/operator/speed`.
#[derive(Debug, serde::Deserialize)]
pub struct SetSpeedRequest {
    /// New tick interval in milliseconds (minimum 10).
    pub tick_interval_ms: u64,
}

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct OperatorResponse {
    ok: bool,
    message: String,
}

fn respond(message: impl Into<String>) -> Json<OperatorResponse> {
    Json(OperatorResponse {
        ok: true,
        message: message.into(),
    })
}

fn operator(state: &AppState) -> Result<&Arc<OperatorState>, LinkError> {
    state
        .operator_state
        .as_ref()
        .ok_or(LinkError::OperatorUnavailable)
}

/// Pause the tick loop. Simulated time does not advance while paused.
pub async fn pause(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, LinkError> {
    operator(&state)?.pause();
    Ok(respond("Coordinator paused"))
}

/// Resume the tick loop after a pause.
pub async fn resume(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, LinkError> {
    operator(&state)?.resume();
    Ok(respond("Coordinator resumed"))
}

/// Request a clean stop at the next tick boundary.
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, LinkError> {
    operator(&state)?.request_stop();
    Ok(respond("Stop requested, coordinator will end at the next tick boundary"))
}

/// Change the tick interval at runtime.
pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetSpeedRequest>,
) -> Result<impl IntoResponse, LinkError> {
    let previous = operator(&state)?
        .set_tick_interval_ms(body.tick_interval_ms)
        .ok_or_else(|| {
            LinkError::InvalidRequest(format!(
                "tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}"
            ))
        })?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "message": format!("Tick interval changed from {previous}ms to {}ms", body.tick_interval_ms),
        "previous_interval_ms": previous,
        "new_interval_ms": body.tick_interval_ms,
    })))
}

/// Queue a Move command for the next tick.
pub async fn move_object(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MoveMessage>,
) -> Result<impl IntoResponse, LinkError> {
    let operator = operator(&state)?;
    require_name("object_name", &body.object_name)?;
    require_name("destination_name", &body.destination_name)?;
    if !body.speed.is_finite() || body.speed < 0.0 {
        return Err(LinkError::InvalidRequest(format!(
            "speed must be a non-negative number, got {}",
            body.speed
        )));
    }

    let message = format!("Move of '{}' queued for next tick", body.object_name);
    operator.queue_command(ObjectCommand::Move(body)).await;
    Ok(respond(message))
}

/// Queue a Dispose command for the next tick.
pub async fn dispose_object(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DisposeMessage>,
) -> Result<impl IntoResponse, LinkError> {
    let operator = operator(&state)?;
    require_name("object_name", &body.object_name)?;

    let message = format!("Dispose of '{}' queued for next tick", body.object_name);
    operator.queue_command(ObjectCommand::Dispose(body)).await;
    Ok(respond(message))
}

fn require_name(field: &str, value: &str) -> Result<(), LinkError> {
    if value.trim().is_empty() {
        return Err(LinkError::InvalidRequest(format!("{field} must not be empty")));
    }
    Ok(())
}
