//! Event sink - the inbound side of the connection actor's mailbox.
//!
//! Transports and schedulers run outside the manager. They hand their
//! events to an [`EventSink`], and the actor feeds them to the manager one
//! at a time.

use tokio::sync::mpsc;

use crate::domain::connection::{ConnectionEvent, TransportEvent};
use crate::domain::foundation::{ConnectionId, TimerId};

/// Cloneable sender for [`ConnectionEvent`]s.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<ConnectionEvent>,
}

impl EventSink {
    /// Creates a sink and the receiver that drains it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Delivers a transport event. Returns false once the receiver is gone.
    pub fn emit(&self, connection: ConnectionId, event: TransportEvent) -> bool {
        self.tx
            .send(ConnectionEvent::transport(connection, event))
            .is_ok()
    }

    /// Delivers a timer fire. Returns false once the receiver is gone.
    pub fn reconnect_due(&self, timer: TimerId) -> bool {
        self.tx.send(ConnectionEvent::ReconnectDue(timer)).is_ok()
    }
}
