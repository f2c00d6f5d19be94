//! Outbound message sink and connection lifecycle.
//!
//! The tick loop never talks to the network directly. It writes encoded
//! messages into a [`MessageSink`], and watches a shared
//! [`ConnectionState`] to learn whether a visualization client is attached.
//!
//! [`ChannelSink`] is the production sink: an unbounded channel whose
//! receiving half is drained by the link server's connection task, which
//! is the only writer on the socket. Channel order is wire order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

/// Errors raised when handing a message to a sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// No client is connected.
    #[error("visualization client is not connected")]
    Disconnected,

    /// The receiving side of the sink has been dropped.
    #[error("message channel closed")]
    Closed,
}

/// Destination for encoded outbound messages.
///
/// Implementations must preserve the order in which messages are sent.
pub trait MessageSink {
    /// Hand one encoded message to the sink.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the message cannot be delivered. The caller
    /// should treat this as a lost connection.
    fn send(&mut self, message: String) -> Result<(), SinkError>;

    /// Whether the sink can currently accept messages.
    fn is_ready(&self) -> bool;
}

/// Shared "is a client attached" flag.
///
/// Set by the link server when a client connects or disconnects, and
/// polled by the tick loop.
#[derive(Debug, Default)]
pub struct ConnectionState {
    connected: AtomicBool,
    sessions: AtomicU64,
}

impl ConnectionState {
    /// Create a disconnected state.
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            sessions: AtomicU64::new(0),
        }
    }

    /// Record that a client connected. Returns `false` if one already was.
    pub fn try_connect(&self) -> bool {
        let claimed = self
            .connected
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            let session = self.sessions.fetch_add(1, Ordering::AcqRel).saturating_add(1);
            debug!(session, "Visualization client attached");
        }
        claimed
    }

    /// Record that the client went away.
    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::AcqRel) {
            debug!("Visualization client detached");
        }
    }

    /// Whether a client is currently attached.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Number of client sessions seen so far.
    pub fn sessions(&self) -> u64 {
        self.sessions.load(Ordering::Acquire)
    }

    /// Sleep in `poll` steps until a client is attached.
    pub async fn wait_until_connected(&self, poll: Duration) {
        while !self.is_connected() {
            tokio::time::sleep(poll).await;
        }
    }
}

/// Sink backed by an unbounded channel to the link server.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
    connection: Arc<ConnectionState>,
}

impl ChannelSink {
    /// Create a sink and the receiver the connection task drains.
    pub fn channel(connection: Arc<ConnectionState>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, connection }, rx)
    }
}

impl MessageSink for ChannelSink {
    fn send(&mut self, message: String) -> Result<(), SinkError> {
        if !self.connection.is_connected() {
            return Err(SinkError::Disconnected);
        }
        self.tx.send(message).map_err(|_closed| SinkError::Closed)
    }

    fn is_ready(&self) -> bool {
        self.connection.is_connected() && !self.tx.is_closed()
    }
}

/// In-memory sink that records every message.
///
/// Useful for tests and dry runs. It can be told to drop its connection
/// after a number of messages.
#[derive(Debug, Clone)]
pub struct MemorySink {
    messages: Vec<String>,
    connected: bool,
    fail_after: Option<usize>,
}

impl MemorySink {
    /// Create a connected sink with no failure limit.
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
            connected: true,
            fail_after: None,
        }
    }

    /// Create a connected sink that disconnects once `limit` messages
    /// have been accepted.
    pub const fn failing_after(limit: usize) -> Self {
        Self {
            messages: Vec::new(),
            connected: true,
            fail_after: Some(limit),
        }
    }

    /// Messages accepted so far, in order.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Mark the sink disconnected.
    pub const fn disconnect(&mut self) {
        self.connected = false;
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSink for MemorySink {
    fn send(&mut self, message: String) -> Result<(), SinkError> {
        if self
            .fail_after
            .is_some_and(|limit| self.messages.len() >= limit)
        {
            self.connected = false;
        }
        if !self.connected {
            return Err(SinkError::Disconnected);
        }
        self.messages.push(message);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.connected
    }
}
