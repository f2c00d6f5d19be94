//! Link server between the Harbour coordinator and its visualization.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/visualization`) carrying the
//!   coordinator's outbound messages to the single visualization client
//! - **Status endpoint** (`/api/status`) and a minimal HTML page (`/`)
//! - **Operator REST endpoints** for runtime control (pause, resume,
//!   speed, stop) and for queueing Move/Dispose commands
//!
//! # Architecture
//!
//! The coordinator writes encoded messages into a
//! [`ChannelSink`](harbour_core::sink::ChannelSink). The receiving half
//! lives in [`AppState`] and is owned by whichever client session is
//! active, so the socket task is the only writer on the wire. REST reads
//! are served from a [`CoordinatorSnapshot`] refreshed after every tick.

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError};
pub use startup::{StartupError, spawn_link};
pub use state::{AppState, CoordinatorSnapshot};
