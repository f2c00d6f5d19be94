//! Link server lifecycle management.
//!
//! [`bind`] claims the listening socket and [`serve`] runs the Axum
//! server on it until the process ends. [`crate::spawn_link`] runs the pair
//! in the background.

use std::net::SocketAddr;
use std::sync::Arc;

use harbour_core::config::LinkConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Configuration for the link server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 3000,
        }
    }
}

impl From<&LinkConfig> for ServerConfig {
    fn from(link: &LinkConfig) -> Self {
        Self {
            host: link.host.clone(),
            port: link.port,
        }
    }
}

/// Bind the configured address.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or in use.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, "Link server listening");
    Ok(listener)
}

/// Serve the link router on an already bound listener.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the server hits a fatal I/O error.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), ServerError> {
    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))
}

/// Errors that can occur when starting or running the link server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn server_config_follows_link_config() {
        let link = LinkConfig {
            host: "127.0.0.1".to_owned(),
            port: 4100,
            ..LinkConfig::default()
        };
        let config = ServerConfig::from(&link);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 4100);
    }

    #[tokio::test]
    async fn bind_rejects_bad_address() {
        let config = ServerConfig {
            host: "not an address".to_owned(),
            port: 1,
        };
        assert!(matches!(bind(&config).await, Err(ServerError::Bind(_))));
    }

    #[tokio::test]
    async fn bind_on_ephemeral_port() {
        let config = ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 0,
        };
        let listener = bind(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
