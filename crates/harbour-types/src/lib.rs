//! Shared type definitions for the Harbour coordinator.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries: container identity and coordinates, transport categories,
//! and the messages sent to the visualization client. JSON-facing types
//! derive `ts-rs` so the client can consume generated `TypeScript`
//! bindings.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier newtypes for containers, transporters and messages
//! - [`enums`] -- [`TransportCategory`]
//! - [`structs`] -- [`Container`] and its coordinate types
//! - [`messages`] -- Outbound messages and their wire encodings

pub mod enums;
pub mod ids;
pub mod messages;
pub mod structs;

pub use enums::{TransportCategory, UnknownCategory};
pub use ids::{ContainerId, MessageId, TransporterId};
pub use messages::{
    CreateMessage, DisposeMessage, EncodeError, MoveMessage, OutboundMessage, WireFormat,
};
pub use structs::{Container, GridPoint, SpawnPoint};
