//! Turns transporters and object commands into outbound messages.
//!
//! The emitter owns the [`MessageSink`] and the message id sequence.
//! [`EventEmitter::emit_created`] only borrows the transporter, so a caller
//! whose send failed still holds every container and can retry later.

use harbour_types::{
    CreateMessage, DisposeMessage, EncodeError, MessageId, MoveMessage, OutboundMessage,
    WireFormat,
};
use tracing::debug;

use crate::sink::{MessageSink, SinkError};
use crate::transporter::Transporter;

/// Errors raised while emitting a message.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// The message could not be encoded. Nothing was sent.
    #[error("encode error: {source}")]
    Encode {
        /// The underlying encode error.
        #[from]
        source: EncodeError,
    },

    /// The sink rejected the message.
    #[error("sink error: {source}")]
    Sink {
        /// The underlying sink error.
        #[from]
        source: SinkError,
    },
}

/// Encodes outbound messages and writes them to a sink.
#[derive(Debug)]
pub struct EventEmitter<S> {
    sink: S,
    format: WireFormat,
    next_id: u64,
}

impl<S: MessageSink> EventEmitter<S> {
    /// Create an emitter writing `format`-encoded messages into `sink`.
    pub const fn new(sink: S, format: WireFormat) -> Self {
        Self {
            sink,
            format,
            next_id: 1,
        }
    }

    /// Emit a create message for a freshly loaded transporter.
    ///
    /// Containers are listed in grid order: x ascending, y ascending, each
    /// stack bottom to top. A failed send still consumes a message id.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError`] if encoding fails or the sink rejects the
    /// message.
    pub fn emit_created(&mut self, transporter: &Transporter) -> Result<MessageId, EmitError> {
        let id = self.allocate_id();
        let transporter_id = transporter.id();
        let category = transporter.category();
        let message = OutboundMessage::Create(CreateMessage {
            id,
            transporter_id,
            category,
            containers: transporter.containers().cloned().collect(),
        });
        self.send(&message)?;
        debug!(message_id = %id, %transporter_id, %category, "Create message sent");
        Ok(id)
    }

    /// Emit a move command for a previously created object.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError`] if encoding fails or the sink rejects the
    /// message.
    pub fn emit_move(&mut self, command: MoveMessage) -> Result<(), EmitError> {
        self.send(&OutboundMessage::Move(command))
    }

    /// Emit a dispose command for a previously created object.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError`] if encoding fails or the sink rejects the
    /// message.
    pub fn emit_dispose(&mut self, command: DisposeMessage) -> Result<(), EmitError> {
        self.send(&OutboundMessage::Dispose(command))
    }

    /// Whether the underlying sink can accept messages.
    pub fn is_ready(&self) -> bool {
        self.sink.is_ready()
    }

    /// Borrow the underlying sink.
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the underlying sink.
    pub const fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn send(&mut self, message: &OutboundMessage) -> Result<(), EmitError> {
        let text = message.encode(self.format)?;
        self.sink.send(text)?;
        Ok(())
    }

    fn allocate_id(&mut self) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }
}
