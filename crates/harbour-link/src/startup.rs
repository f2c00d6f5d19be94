//! Link server startup helper for embedding in the engine binary.
//!
//! [`spawn_link`] binds the listener eagerly, so a port conflict fails
//! startup instead of a background task, then serves on a Tokio task
//! alongside the coordinator loop.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the link server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Bind and spawn the link server on a background Tokio task.
///
/// The server runs until the runtime shuts down or the returned handle
/// is aborted.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address cannot be bound.
pub async fn spawn_link(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, StartupError> {
    let listener = server::bind(config).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            tracing::error!(error = %e, "Link server exited with error");
        }
    });

    tracing::info!(host = %config.host, port = config.port, "Link server spawned on background task");

    Ok(handle)
}
