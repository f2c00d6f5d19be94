//! Axum router construction for the link server.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS enabled so a browser-hosted visualization can connect.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::operator;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the link server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/visualization` -- the single visualization client
/// - `GET /api/status` -- coordinator status
/// - `POST /api/operator/{pause,resume,stop,speed,move,dispose}` -- operator controls
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/visualization", get(ws::ws_visualization))
        // REST API
        .route("/api/status", get(handlers::status))
        // Operator API
        .route("/api/operator/pause", post(operator::pause))
        .route("/api/operator/resume", post(operator::resume))
        .route("/api/operator/stop", post(operator::stop))
        .route("/api/operator/speed", post(operator::set_speed))
        .route("/api/operator/move", post(operator::move_object))
        .route("/api/operator/dispose", post(operator::dispose_object))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
