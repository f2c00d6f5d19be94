//! Coordinator loop with connection handling and operator controls.
//!
//! [`run_coordinator`] is the top-level async function that drives the
//! tick loop. It alternates between two phases:
//!
//! - **Connection wait**: poll the sink every `connection_poll` until a
//!   visualization client is attached.
//! - **Tick phase**: run ticks every `tick_interval_ms` until the sink
//!   reports the client gone, then fall back to the connection wait.
//!
//! Around both phases it honours the operator's pause, stop and speed
//! controls and the configured tick and real-time bounds. Simulated time
//! starts on the first connection and is never reset by a reconnect.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::emitter::EventEmitter;
use crate::operator::{OperatorState, StopReason};
use crate::sink::{MessageSink, SinkError};
use crate::tick::{self, CoordinatorState, TickError, TickSummary};

/// Errors that end the coordinator loop.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The sink's receiving side is gone and no client can ever attach.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of a coordinator run.
#[derive(Debug)]
pub struct CoordinatorRun {
    /// The reason the loop ended.
    pub end_reason: StopReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// Number of client sessions the loop ticked through.
    pub sessions: u64,
}

/// Callback invoked by the coordinator loop.
///
/// Implementations can use this to refresh the status snapshot served by
/// the link server.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &CoordinatorState);

    /// Called when the loop enters or leaves the tick phase.
    fn on_connection_change(&mut self, _connected: bool, _state: &CoordinatorState) {}
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &CoordinatorState) {}
}

/// Outcome of waiting for a client.
enum Wait {
    Connected,
    Ended(StopReason),
}

/// Run the coordinator loop until a termination condition is met.
///
/// # Arguments
///
/// * `state` - Clock, pool and counters, owned by the loop
/// * `emitter` - Encoder and sink for outbound messages
/// * `operator` - Shared operator control state
/// * `connection_poll` - How often to check for a client while none is attached
/// * `callback` - Called after each tick and on connection changes
///
/// # Errors
///
/// Returns [`RunnerError`] if the sink is closed for good.
pub async fn run_coordinator<S: MessageSink>(
    state: &mut CoordinatorState,
    emitter: &mut EventEmitter<S>,
    operator: &Arc<OperatorState>,
    connection_poll: Duration,
    callback: &mut dyn TickCallback,
) -> Result<CoordinatorRun, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;
    let mut sessions: u64 = 0;

    info!(
        pending = state.pool.len(),
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        poll_ms = connection_poll.as_millis(),
        "Coordinator starting"
    );

    loop {
        // --- Connection wait ---
        if let Wait::Ended(reason) = wait_for_client(emitter, operator, connection_poll).await {
            return Ok(finish(operator, reason, last_summary, total_ticks, sessions).await);
        }
        sessions = sessions.saturating_add(1);
        if state.clock.is_initialized() {
            state.clock.resync();
            info!(session = sessions, simulated_time = %state.clock.now(), "Client reattached, resuming");
        } else {
            state.clock.initialize();
            info!(simulated_time = %state.clock.now(), "Client attached, simulation clock started");
        }
        callback.on_connection_change(true, state);

        // --- Tick phase ---
        loop {
            if operator.is_paused() {
                info!("Coordinator paused, waiting for resume...");
                operator.wait_if_paused().await;
                state.clock.resync();
                info!("Coordinator resumed");
            }

            if let Some(reason) = check_bounds(operator, total_ticks) {
                return Ok(finish(operator, reason, last_summary, total_ticks, sessions).await);
            }

            if !emitter.is_ready() {
                lost_client(state, callback);
                break;
            }

            let commands = operator.drain_commands().await;
            match tick::run_tick(state, emitter, commands) {
                Ok(summary) => {
                    total_ticks = total_ticks.saturating_add(1);
                    callback.on_tick(&summary, state);
                    last_summary = Some(summary);
                }
                Err(TickError::Sink {
                    source: SinkError::Disconnected,
                }) => {
                    lost_client(state, callback);
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            if let Some(reason) = check_bounds(operator, total_ticks) {
                return Ok(finish(operator, reason, last_summary, total_ticks, sessions).await);
            }

            tokio::time::sleep(Duration::from_millis(operator.tick_interval_ms())).await;
        }
    }
}

/// Poll until the emitter is ready or the run should end.
async fn wait_for_client<S: MessageSink>(
    emitter: &EventEmitter<S>,
    operator: &OperatorState,
    poll: Duration,
) -> Wait {
    if !emitter.is_ready() {
        info!("Waiting for visualization client");
    }
    loop {
        if operator.is_stop_requested() {
            return Wait::Ended(StopReason::OperatorStop);
        }
        if operator.time_limit_reached() {
            return Wait::Ended(StopReason::MaxRealTimeReached);
        }
        if emitter.is_ready() {
            return Wait::Connected;
        }
        tokio::time::sleep(poll).await;
    }
}

fn lost_client(state: &CoordinatorState, callback: &mut dyn TickCallback) {
    warn!(
        backlog = state.backlog.len(),
        pending = state.pool.len(),
        "Visualization client lost, waiting for reconnect"
    );
    callback.on_connection_change(false, state);
}

/// Stop, real-time and tick bounds, in that order.
fn check_bounds(operator: &OperatorState, completed_ticks: u64) -> Option<StopReason> {
    if operator.is_stop_requested() {
        info!("Operator stop requested");
        return Some(StopReason::OperatorStop);
    }
    if operator.time_limit_reached() {
        info!(
            max_seconds = operator.max_real_time_seconds(),
            elapsed = operator.elapsed_seconds(),
            "Real-time limit reached"
        );
        return Some(StopReason::MaxRealTimeReached);
    }
    if operator.tick_limit_reached(completed_ticks) {
        info!(
            ticks = completed_ticks,
            max_ticks = operator.max_ticks(),
            "Tick limit reached"
        );
        return Some(StopReason::MaxTicksReached);
    }
    None
}

async fn finish(
    operator: &OperatorState,
    reason: StopReason,
    final_summary: Option<TickSummary>,
    total_ticks: u64,
    sessions: u64,
) -> CoordinatorRun {
    operator.set_end_reason(reason.clone()).await;
    CoordinatorRun {
        end_reason: reason,
        final_summary,
        total_ticks,
        sessions,
    }
}

/// Log the end of a coordinator run.
///
/// The link server keeps running after this returns so the final status
/// stays queryable.
pub fn log_run_end(result: &CoordinatorRun) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        sessions = result.sessions,
        final_simulated_time = ?result.final_summary.as_ref().map(|s| s.simulated_time),
        final_pending = result.final_summary.as_ref().map(|s| s.pending_containers),
        "Coordinator ended"
    );
}
