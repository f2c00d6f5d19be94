//! A single coordinator tick.
//!
//! Each tick runs these steps in order:
//!
//! 1. **Advance** -- move the simulation clock forward by the scaled
//!    wall-clock delta.
//! 2. **Extract** -- remove every container scheduled strictly before the
//!    new simulated time from the pool.
//! 3. **Distribute** -- load the due containers onto new transporters.
//! 4. **Emit** -- send one create message per transporter, then any queued
//!    object commands.
//!
//! Transporters that could not be sent because the client went away stay
//! in the state's backlog and are sent first on the next tick that has a
//! connection.

use std::collections::VecDeque;

use chrono::NaiveDateTime;
use tracing::{debug, error, info, warn};

use crate::clock::SimulationClock;
use crate::distribution;
use crate::emitter::{EmitError, EventEmitter};
use crate::operator::ObjectCommand;
use crate::pool::ContainerPool;
use crate::sink::{MessageSink, SinkError};
use crate::transporter::Transporter;

/// Errors that end a tick early.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The sink stopped accepting messages.
    #[error("sink error: {source}")]
    Sink {
        /// The underlying sink error.
        #[from]
        source: SinkError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed (1-based).
    pub tick: u64,
    /// Simulated time after the clock advanced.
    pub simulated_time: NaiveDateTime,
    /// Containers taken from the pool this tick.
    pub containers_released: usize,
    /// Create messages sent this tick.
    pub transporters_created: usize,
    /// Object commands sent this tick.
    pub commands_sent: usize,
    /// Containers still waiting in the pool.
    pub pending_containers: usize,
}

/// Mutable coordinator state owned by the tick loop.
#[derive(Debug)]
pub struct CoordinatorState {
    /// The simulation clock.
    pub clock: SimulationClock,
    /// Containers not yet due.
    pub pool: ContainerPool,
    /// Loaded transporters waiting to be sent.
    pub backlog: VecDeque<Transporter>,
    /// Completed ticks.
    pub ticks: u64,
    /// Create messages sent since start.
    pub transporters_created: u64,
}

impl CoordinatorState {
    /// Bundle a clock and a filled pool.
    pub const fn new(clock: SimulationClock, pool: ContainerPool) -> Self {
        Self {
            clock,
            pool,
            backlog: VecDeque::new(),
            ticks: 0,
            transporters_created: 0,
        }
    }
}

/// Run one tick.
///
/// # Errors
///
/// Returns [`TickError::Sink`] when the sink stops accepting messages.
/// Unsent transporters remain in [`CoordinatorState::backlog`]; unsent
/// commands are dropped with a warning.
pub fn run_tick<S: MessageSink>(
    state: &mut CoordinatorState,
    emitter: &mut EventEmitter<S>,
    commands: Vec<ObjectCommand>,
) -> Result<TickSummary, TickError> {
    let now = state.clock.advance();

    let due = state.pool.extract_due(now);
    let containers_released = due.len();
    if containers_released > 0 {
        let transporters = distribution::distribute(due);
        debug!(
            simulated_time = %now,
            containers = containers_released,
            transporters = transporters.len(),
            "Due containers distributed"
        );
        state.backlog.extend(transporters);
    }

    let transporters_created = flush_backlog(state, emitter)?;
    let commands_sent = send_commands(emitter, commands)?;

    state.ticks = state.ticks.saturating_add(1);

    let summary = TickSummary {
        tick: state.ticks,
        simulated_time: now,
        containers_released,
        transporters_created,
        commands_sent,
        pending_containers: state.pool.len(),
    };

    if transporters_created > 0 {
        info!(
            tick = summary.tick,
            simulated_time = %now,
            released = containers_released,
            transporters = transporters_created,
            pending = summary.pending_containers,
            "Transporters dispatched"
        );
    }

    Ok(summary)
}

/// Send queued transporters in order. Returns how many were sent.
fn flush_backlog<S: MessageSink>(
    state: &mut CoordinatorState,
    emitter: &mut EventEmitter<S>,
) -> Result<usize, TickError> {
    let mut sent: usize = 0;
    while let Some(transporter) = state.backlog.pop_front() {
        if !emitter.is_ready() {
            state.backlog.push_front(transporter);
            return Err(SinkError::Disconnected.into());
        }

        let transporter_id = transporter.id();
        let carried = transporter.len();
        match emitter.emit_created(&transporter) {
            Ok(_) => {
                sent = sent.saturating_add(1);
                state.transporters_created = state.transporters_created.saturating_add(1);
            }
            Err(EmitError::Encode { source }) => {
                error!(%transporter_id, carried, error = %source, "Dropping transporter that failed to encode");
            }
            Err(EmitError::Sink { source }) => {
                warn!(
                    %transporter_id,
                    carried,
                    waiting = state.backlog.len().saturating_add(1),
                    error = %source,
                    "Send failed, transporter kept for the next client"
                );
                state.backlog.push_front(transporter);
                return Err(source.into());
            }
        }
    }
    Ok(sent)
}

/// Send operator object commands in order. Returns how many were sent.
fn send_commands<S: MessageSink>(
    emitter: &mut EventEmitter<S>,
    commands: Vec<ObjectCommand>,
) -> Result<usize, TickError> {
    let total = commands.len();
    let mut sent: usize = 0;
    for command in commands {
        let result = match command {
            ObjectCommand::Move(mv) => emitter.emit_move(mv),
            ObjectCommand::Dispose(dispose) => emitter.emit_dispose(dispose),
        };
        match result {
            Ok(()) => sent = sent.saturating_add(1),
            Err(EmitError::Encode { source }) => {
                error!(error = %source, "Dropping object command that failed to encode");
            }
            Err(EmitError::Sink { source }) => {
                warn!(
                    dropped = total.saturating_sub(sent),
                    error = %source,
                    "Object commands dropped with the connection"
                );
                return Err(source.into());
            }
        }
    }
    Ok(sent)
}
