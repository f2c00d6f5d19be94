//! Shared application state for the link server.
//!
//! [`AppState`] holds the receiving half of the coordinator's outbound
//! channel, the shared connection flag, and a snapshot of the coordinator
//! refreshed after every tick. REST reads are served from the snapshot so
//! the server never blocks the tick loop.

use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use harbour_core::operator::OperatorState;
use harbour_core::sink::ConnectionState;
use tokio::sync::{RwLock, mpsc};
use tracing::error;

use crate::error::LinkError;

/// Coordinator counters as of the last completed tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorSnapshot {
    /// Completed ticks.
    pub tick: u64,
    /// Simulated time after the last tick.
    pub simulated_time: NaiveDateTime,
    /// Containers still waiting in the pool.
    pub pending_containers: usize,
    /// Transporters created so far.
    pub transporters_created: u64,
    /// Loaded transporters waiting for a client.
    pub backlog: usize,
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct AppState {
    /// Whether a visualization client is attached.
    pub connection: Arc<ConnectionState>,
    /// Receiving half of the coordinator's outbound channel. Taken by the
    /// active client session and put back when it ends.
    outbound: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    /// The current coordinator snapshot (updated each tick).
    pub snapshot: Arc<RwLock<CoordinatorSnapshot>>,
    /// Shared operator control state (present when the coordinator is running).
    pub operator_state: Option<Arc<OperatorState>>,
}

impl AppState {
    /// Create a state serving `outbound` to whichever client attaches.
    pub fn new(
        connection: Arc<ConnectionState>,
        outbound: mpsc::UnboundedReceiver<String>,
        snapshot: CoordinatorSnapshot,
    ) -> Self {
        Self {
            connection,
            outbound: Mutex::new(Some(outbound)),
            snapshot: Arc::new(RwLock::new(snapshot)),
            operator_state: None,
        }
    }

    /// Attach operator control state.
    #[must_use]
    pub fn with_operator(mut self, operator: Arc<OperatorState>) -> Self {
        self.operator_state = Some(operator);
        self
    }

    /// Take the outbound receiver for a new session.
    pub(crate) fn take_outbound(&self) -> Option<mpsc::UnboundedReceiver<String>> {
        match self.outbound.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Return the outbound receiver when a session ends.
    pub(crate) fn restore_outbound(&self, rx: mpsc::UnboundedReceiver<String>) {
        let mut slot = match self.outbound.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.replace(rx).is_some() {
            error!("Outbound channel restored twice, dropping the older receiver");
        }
    }

    /// Overwrite the snapshot without waiting.
    ///
    /// Returns `false` if a reader holds the lock; the caller's next update
    /// catches up.
    pub fn try_publish(&self, snapshot: CoordinatorSnapshot) -> bool {
        self.snapshot.try_write().is_ok_and(|mut guard| {
            *guard = snapshot;
            true
        })
    }
}

/// An attached client's claim on the outbound channel.
///
/// Dropping the session hands the receiver back and clears the connection
/// flag, whether the socket closed normally or the upgrade never finished.
pub(crate) struct Session {
    state: Arc<AppState>,
    rx: Option<mpsc::UnboundedReceiver<String>>,
}

impl Session {
    /// Claim the single client slot. Returns `Err` with the reason if the
    /// slot is taken or the channel is missing.
    pub(crate) fn claim(state: Arc<AppState>) -> Result<Self, LinkError> {
        if !state.connection.try_connect() {
            return Err(LinkError::ClientBusy);
        }
        let Some(rx) = state.take_outbound() else {
            state.connection.disconnect();
            return Err(LinkError::ChannelUnavailable);
        };
        Ok(Self {
            state,
            rx: Some(rx),
        })
    }

    /// The outbound receiver for this session.
    pub(crate) const fn receiver(&mut self) -> Option<&mut mpsc::UnboundedReceiver<String>> {
        self.rx.as_mut()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Receiver first, so the next client always finds it in place.
        if let Some(rx) = self.rx.take() {
            self.state.restore_outbound(rx);
        }
        self.state.connection.disconnect();
    }
}
