//! Typed lifecycle events delivered to the connection manager.

use crate::domain::foundation::{ConnectionId, TimerId};

/// Something that happened on a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed; the transport accepts writes.
    Opened,

    /// A text frame arrived.
    Message(String),

    /// The transport failed. Always followed by `Closed`.
    Errored(String),

    /// The transport is gone.
    Closed { code: Option<u16>, reason: String },
}

/// Everything the manager reacts to besides caller commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// An event from the transport tagged `connection`.
    Transport {
        connection: ConnectionId,
        event: TransportEvent,
    },

    /// The reconnect timer tagged `timer` elapsed.
    ReconnectDue(TimerId),
}

impl ConnectionEvent {
    pub fn transport(connection: ConnectionId, event: TransportEvent) -> Self {
        ConnectionEvent::Transport { connection, event }
    }
}
