//! Scheduling and distribution engine for the Harbour coordinator.
//!
//! This crate owns the tick cycle that turns a manifest of scheduled
//! containers into a stream of transporter creation events: advance the
//! accelerated clock, extract due containers, distribute them onto
//! transporters, and emit one create message per transporter.
//!
//! # Modules
//!
//! - [`clock`] -- Accelerated simulation clock driven by wall-clock deltas.
//! - [`config`] -- Configuration loading from `harbour-config.yaml` into
//!   strongly-typed structs.
//! - [`distribution`] -- The bucket-and-round-robin distribution algorithm.
//! - [`emitter`] -- [`EventEmitter`] encoding transporters and object
//!   commands for the sink.
//! - [`manifest`] -- JSON manifest ingestion and validation.
//! - [`operator`] -- Shared pause/resume/stop/speed state and queued
//!   object commands.
//! - [`pool`] -- Pending containers and due extraction.
//! - [`runner`] -- The coordinator loop with connection handling.
//! - [`sink`] -- [`MessageSink`] trait, connection state, channel and
//!   in-memory sinks.
//! - [`tick`] -- A single coordinator tick.
//! - [`transporter`] -- The transporter grid of per-cell stacks.
//!
//! [`EventEmitter`]: emitter::EventEmitter
//! [`MessageSink`]: sink::MessageSink

pub mod clock;
pub mod config;
pub mod distribution;
pub mod emitter;
pub mod manifest;
pub mod operator;
pub mod pool;
pub mod runner;
pub mod sink;
pub mod tick;
pub mod transporter;
