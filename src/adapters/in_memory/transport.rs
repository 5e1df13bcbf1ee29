//! In-memory transport for testing.
//!
//! Records every transport the manager creates together with the frames
//! written to it. Tests drive readiness by hand and inject lifecycle events
//! into the manager themselves.
//!
//! # Security Note
//!
//! This adapter is for **testing only**. It uses `.expect()` on lock
//! operations which will panic if locks are poisoned.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::connection::ReadyState;
use crate::domain::foundation::ConnectionId;
use crate::ports::{Transport, TransportError, TransportFactory};

/// Everything known about one created transport.
#[derive(Debug, Clone)]
pub struct ChannelRecord {
    pub connection: ConnectionId,
    pub url: String,
    pub ready_state: ReadyState,
    pub sent: Vec<String>,
    pub close_requested: bool,
}

#[derive(Debug, Default)]
struct FactoryState {
    channels: Vec<ChannelRecord>,
    fail_next_create: bool,
    fail_writes: bool,
}

/// Transport factory whose transports never touch the network.
///
/// Cloning shares the underlying records, so a test can keep a clone while
/// the manager owns the boxed factory.
///
/// # Panics
///
/// Methods may panic if the internal lock is poisoned.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransportFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl InMemoryTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FactoryState> {
        self.state
            .lock()
            .expect("InMemoryTransportFactory: lock poisoned")
    }

    // === Test Helpers ===

    /// URLs of every transport created so far, oldest first.
    pub fn created_urls(&self) -> Vec<String> {
        self.lock().channels.iter().map(|c| c.url.clone()).collect()
    }

    pub fn created_count(&self) -> usize {
        self.lock().channels.len()
    }

    /// Snapshot of the most recently created transport.
    pub fn latest(&self) -> Option<ChannelRecord> {
        self.lock().channels.last().cloned()
    }

    /// Snapshot of the transport created for `connection`.
    pub fn channel(&self, connection: ConnectionId) -> Option<ChannelRecord> {
        self.lock()
            .channels
            .iter()
            .find(|c| c.connection == connection)
            .cloned()
    }

    /// Sets the readiness reported by the transport for `connection`.
    pub fn set_ready_state(&self, connection: ConnectionId, ready_state: ReadyState) {
        if let Some(channel) = self
            .lock()
            .channels
            .iter_mut()
            .find(|c| c.connection == connection)
        {
            channel.ready_state = ready_state;
        }
    }

    /// Makes the next `create` call fail with [`TransportError::InvalidUrl`].
    pub fn fail_next_create(&self) {
        self.lock().fail_next_create = true;
    }

    /// Makes every subsequent write fail with [`TransportError::ChannelClosed`].
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }
}

impl TransportFactory for InMemoryTransportFactory {
    fn create(
        &self,
        connection: ConnectionId,
        url: &str,
    ) -> Result<Box<dyn Transport>, TransportError> {
        let mut state = self.lock();
        if std::mem::take(&mut state.fail_next_create) {
            return Err(TransportError::InvalidUrl {
                url: url.to_string(),
                reason: "rejected by test".to_string(),
            });
        }

        state.channels.push(ChannelRecord {
            connection,
            url: url.to_string(),
            ready_state: ReadyState::Connecting,
            sent: Vec::new(),
            close_requested: false,
        });

        Ok(Box::new(InMemoryTransport {
            connection,
            state: Arc::clone(&self.state),
        }))
    }
}

/// Transport handed out by [`InMemoryTransportFactory`].
struct InMemoryTransport {
    connection: ConnectionId,
    state: Arc<Mutex<FactoryState>>,
}

impl InMemoryTransport {
    fn with_channel<R>(&self, f: impl FnOnce(&mut ChannelRecord, bool) -> R) -> Option<R> {
        let mut state = self.state.lock().expect("InMemoryTransport: lock poisoned");
        let fail_writes = state.fail_writes;
        state
            .channels
            .iter_mut()
            .find(|c| c.connection == self.connection)
            .map(|channel| f(channel, fail_writes))
    }
}

impl Transport for InMemoryTransport {
    fn ready_state(&self) -> ReadyState {
        self.with_channel(|channel, _| channel.ready_state)
            .unwrap_or(ReadyState::Closed)
    }

    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.with_channel(|channel, fail_writes| {
            if !channel.ready_state.is_open() {
                return Err(TransportError::NotOpen);
            }
            if fail_writes {
                return Err(TransportError::ChannelClosed);
            }
            channel.sent.push(text.to_string());
            Ok(())
        })
        .unwrap_or(Err(TransportError::ChannelClosed))
    }

    fn close(&mut self) {
        self.with_channel(|channel, _| {
            channel.close_requested = true;
            channel.ready_state = ReadyState::Closed;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_created_transports() {
        let factory = InMemoryTransportFactory::new();
        factory.create(ConnectionId::new(1), "ws://a").unwrap();
        factory.create(ConnectionId::new(2), "ws://b").unwrap();

        assert_eq!(factory.created_urls(), vec!["ws://a", "ws://b"]);
        assert_eq!(factory.latest().unwrap().connection, ConnectionId::new(2));
    }

    #[test]
    fn writes_require_open_state() {
        let factory = InMemoryTransportFactory::new();
        let connection = ConnectionId::new(1);
        let mut transport = factory.create(connection, "ws://a").unwrap();

        assert!(matches!(transport.send_text("x"), Err(TransportError::NotOpen)));

        factory.set_ready_state(connection, ReadyState::Open);
        transport.send_text("hello").unwrap();
        assert_eq!(factory.channel(connection).unwrap().sent, vec!["hello"]);
    }

    #[test]
    fn close_marks_channel_closed() {
        let factory = InMemoryTransportFactory::new();
        let connection = ConnectionId::new(1);
        let mut transport = factory.create(connection, "ws://a").unwrap();
        factory.set_ready_state(connection, ReadyState::Open);

        transport.close();

        let record = factory.channel(connection).unwrap();
        assert!(record.close_requested);
        assert_eq!(transport.ready_state(), ReadyState::Closed);
    }

    #[test]
    fn fail_next_create_applies_once() {
        let factory = InMemoryTransportFactory::new();
        factory.fail_next_create();
        assert!(factory.create(ConnectionId::new(1), "ws://a").is_err());
        assert!(factory.create(ConnectionId::new(2), "ws://a").is_ok());
        assert_eq!(factory.created_count(), 1);
    }
}
