//! Controls shared between the tick loop and the operator endpoints.
//!
//! Pause, stop and the tick interval are plain atomics read once per tick.
//! Move and Dispose requests are queued behind a mutex and drained by the
//! tick loop, so only the tick loop ever writes to the outbound sink.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use harbour_types::{DisposeMessage, MoveMessage};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::SimulationBoundsConfig;

/// Smallest tick interval the operator may set, in milliseconds.
pub const MIN_TICK_INTERVAL_MS: u64 = 10;

/// Reason why the coordinator stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// An operator issued a stop command.
    OperatorStop,
}

/// A command for an object the visualization already shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ObjectCommand {
    /// Relocate an object.
    Move(MoveMessage),
    /// Remove an object.
    Dispose(DisposeMessage),
}

/// Runtime controls for one coordinator run.
///
/// Held in an [`Arc`](std::sync::Arc) by the runner and the link server.
#[derive(Debug)]
pub struct OperatorState {
    paused: AtomicBool,

    /// Wakes a paused tick loop on resume or stop.
    resume_notify: Notify,

    stop_requested: AtomicBool,

    /// Milliseconds between ticks.
    tick_interval_ms: AtomicU64,

    /// Wall-clock start, for `max_real_time_seconds`.
    started_at: DateTime<Utc>,

    /// Tick limit, 0 for none.
    max_ticks: u64,

    /// Wall-clock limit in seconds, 0 for none.
    max_real_time_seconds: u64,

    /// Move and Dispose requests not yet sent.
    pending_commands: Mutex<Vec<ObjectCommand>>,

    end_reason: Mutex<Option<StopReason>>,
}

impl OperatorState {
    /// Start unpaused with the configured interval and limits. An interval
    /// under [`MIN_TICK_INTERVAL_MS`] is raised to it.
    pub fn new(bounds: &SimulationBoundsConfig) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(bounds.tick_interval_ms.max(MIN_TICK_INTERVAL_MS)),
            started_at: Utc::now(),
            max_ticks: bounds.max_ticks,
            max_real_time_seconds: bounds.max_real_time_seconds,
            pending_commands: Mutex::new(Vec::new()),
            end_reason: Mutex::new(None),
        }
    }

    /// Paused flag.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Hold the tick loop before its next tick.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Let a paused tick loop continue.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Block while paused. A stop request releases the wait too.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    /// Ask the runner to finish at the next tick boundary.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Stop flag.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Store why the run ended.
    pub async fn set_end_reason(&self, reason: StopReason) {
        let mut guard = self.end_reason.lock().await;
        *guard = Some(reason);
    }

    /// Why the run ended, once it has.
    pub async fn end_reason(&self) -> Option<StopReason> {
        self.end_reason.lock().await.clone()
    }

    /// Current interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Swap in a new interval and return the old one. Values under
    /// [`MIN_TICK_INTERVAL_MS`] are refused with `None`.
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        Some(self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    /// Whether a nonzero tick limit has been hit.
    pub const fn tick_limit_reached(&self, completed_ticks: u64) -> bool {
        self.max_ticks > 0 && completed_ticks >= self.max_ticks
    }

    /// Whether a nonzero wall-clock limit has been hit.
    pub fn time_limit_reached(&self) -> bool {
        self.max_real_time_seconds > 0 && self.elapsed_seconds() >= self.max_real_time_seconds
    }

    /// Whole wall-clock seconds since construction.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Configured tick limit.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Configured wall-clock limit.
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.max_real_time_seconds
    }

    /// Queue a request; the runner sends it after the next tick's creations.
    pub async fn queue_command(&self, command: ObjectCommand) {
        self.pending_commands.lock().await.push(command);
    }

    /// Take every queued request, oldest first.
    pub async fn drain_commands(&self) -> Vec<ObjectCommand> {
        std::mem::take(&mut *self.pending_commands.lock().await)
    }
}

/// Body of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStatus {
    /// Completed ticks.
    pub tick: u64,
    /// Current simulated time.
    pub simulated_time: chrono::NaiveDateTime,
    /// Containers still waiting in the pool.
    pub pending_containers: usize,
    /// Transporters created so far.
    pub transporters_created: u64,
    /// Whether a visualization client is attached.
    pub connected: bool,
    /// Whether the tick loop is paused.
    pub paused: bool,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Current tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Seconds since start.
    pub elapsed_seconds: u64,
    /// Client sessions seen so far.
    pub sessions: u64,
    /// Why the coordinator stopped, once it has.
    pub end_reason: Option<StopReason>,
}
