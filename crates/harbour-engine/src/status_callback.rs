//! Tick callback that keeps the link server's status snapshot current.

use std::sync::Arc;

use harbour_core::runner::TickCallback;
use harbour_core::tick::{CoordinatorState, TickSummary};
use harbour_link::state::{AppState, CoordinatorSnapshot};
use tracing::debug;

/// Callback that bridges the coordinator loop to the link server.
pub struct StatusCallback {
    state: Arc<AppState>,
}

impl StatusCallback {
    /// Create a callback publishing into the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    fn publish(&self, coordinator: &CoordinatorState) {
        // try_write keeps the tick loop from waiting on a REST reader; the
        // next tick catches up.
        if !self.state.try_publish(snapshot_of(coordinator)) {
            debug!(tick = coordinator.ticks, "Status snapshot busy, skipped");
        }
    }
}

impl TickCallback for StatusCallback {
    fn on_tick(&mut self, _summary: &TickSummary, coordinator: &CoordinatorState) {
        self.publish(coordinator);
    }

    fn on_connection_change(&mut self, _connected: bool, coordinator: &CoordinatorState) {
        self.publish(coordinator);
    }
}

/// Project the coordinator state onto the snapshot the link server serves.
pub fn snapshot_of(coordinator: &CoordinatorState) -> CoordinatorSnapshot {
    CoordinatorSnapshot {
        tick: coordinator.ticks,
        simulated_time: coordinator.clock.now(),
        pending_containers: coordinator.pool.len(),
        transporters_created: coordinator.transporters_created,
        backlog: coordinator.backlog.len(),
    }
}
