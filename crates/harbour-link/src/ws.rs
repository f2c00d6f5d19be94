//! `WebSocket` endpoint for the visualization client.
//!
//! The client connects to `GET /ws/visualization` and receives every
//! outbound coordinator message as a text frame, in the order the tick
//! loop produced them. Only one client may be attached at a time; a second
//! concurrent upgrade is refused with `409 Conflict`.
//!
//! This task is the only writer on the socket. While it runs it owns the
//! receiving half of the outbound channel; when the client goes away the
//! receiver is handed back so the next client continues the same stream.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt as _, StreamExt as _};
use tracing::{debug, info, warn};

use crate::error::LinkError;
use crate::state::{AppState, Session};

/// Upgrade an HTTP request to the visualization `WebSocket`.
///
/// # Route
///
/// `GET /ws/visualization`
pub async fn ws_visualization(
    State(state): State<Arc<AppState>>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if state.connection.is_connected() {
        return LinkError::ClientBusy.into_response();
    }
    let ws = match upgrade {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };
    match Session::claim(state) {
        Ok(session) => ws.on_upgrade(move |socket| handle_ws(socket, session)),
        Err(e) => e.into_response(),
    }
}

/// Forward outbound messages to the socket until either side closes.
async fn handle_ws(socket: WebSocket, mut session: Session) {
    info!("Visualization client connected");

    let Some(rx) = session.receiver() else {
        return;
    };
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            // Next outbound message from the tick loop.
            outbound = rx.recv() => {
                let Some(text) = outbound else {
                    debug!("Outbound channel closed, shutting down WebSocket");
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                };
                if let Err(e) = sender.send(Message::Text(text.into())).await {
                    warn!(error = %e, "Send failed, one outbound message dropped");
                    break;
                }
            }
            // Frames from the client.
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client closed the connection");
                        break;
                    }
                    Some(Ok(Message::Text(text))) => {
                        debug!(message = %text.as_str(), "Inbound client message");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    info!("Visualization client disconnected");
}
