//! Error types for the link server.
//!
//! [`LinkError`] covers every failure a request can hit and converts into
//! an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the link HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// A visualization client is already attached.
    #[error("a visualization client is already connected")]
    ClientBusy,

    /// The outbound message channel is not available to hand out.
    #[error("outbound channel unavailable")]
    ChannelUnavailable,

    /// No operator state is attached to the server.
    #[error("operator state not available")]
    OperatorUnavailable,

    /// The request body failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl IntoResponse for LinkError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::ClientBusy => StatusCode::CONFLICT,
            Self::ChannelUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OperatorUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
