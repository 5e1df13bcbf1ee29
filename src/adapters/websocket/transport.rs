//! WebSocket transport built on tokio-tungstenite.
//!
//! Each transport is driven by its own tokio task:
//! 1. Perform the handshake, emit `Opened` (or `Errored` + `Closed`)
//! 2. Forward inbound text frames as `Message`
//! 3. Write frames queued through [`Transport::send_text`]
//! 4. Emit `Closed` exactly once when the socket goes away
//!
//! Must be created from within a tokio runtime.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use crate::domain::connection::{ReadyState, TransportEvent};
use crate::domain::foundation::ConnectionId;
use crate::ports::{EventSink, Transport, TransportError, TransportFactory};

/// Close code reported when the socket vanished without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;

/// Creates [`WebSocketTransport`]s that report to an [`EventSink`].
#[derive(Debug, Clone)]
pub struct WebSocketTransportFactory {
    sink: EventSink,
}

impl WebSocketTransportFactory {
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }
}

impl TransportFactory for WebSocketTransportFactory {
    fn create(
        &self,
        connection: ConnectionId,
        url: &str,
    ) -> Result<Box<dyn Transport>, TransportError> {
        let request = url
            .into_client_request()
            .map_err(|e| TransportError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let ready = Arc::new(SharedReadyState::new(ReadyState::Connecting));
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(drive_socket(
            request,
            connection,
            Arc::clone(&ready),
            outgoing_rx,
            self.sink.clone(),
        ));

        Ok(Box::new(WebSocketTransport {
            ready,
            outgoing: outgoing_tx,
            task,
        }))
    }
}

/// Handle to a socket driven by a background task.
///
/// Dropping the handle closes the socket.
pub struct WebSocketTransport {
    ready: Arc<SharedReadyState>,
    outgoing: mpsc::UnboundedSender<Outgoing>,
    task: JoinHandle<()>,
}

impl Transport for WebSocketTransport {
    fn ready_state(&self) -> ReadyState {
        self.ready.get()
    }

    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        if !self.ready.get().is_open() {
            return Err(TransportError::NotOpen);
        }
        self.outgoing
            .send(Outgoing::Text(text.to_string()))
            .map_err(|_| TransportError::ChannelClosed)
    }

    fn close(&mut self) {
        match self.ready.get() {
            ReadyState::Connecting => {
                // Nothing to say goodbye to yet.
                self.task.abort();
                self.ready.set(ReadyState::Closed);
            }
            ReadyState::Open => {
                self.ready.set(ReadyState::Closing);
                let _ = self.outgoing.send(Outgoing::Close);
            }
            ReadyState::Closing | ReadyState::Closed => {}
        }
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.close();
    }
}

enum Outgoing {
    Text(String),
    Close,
}

/// Readiness shared between the handle and its driving task.
#[derive(Debug)]
struct SharedReadyState(AtomicU8);

impl SharedReadyState {
    fn new(state: ReadyState) -> Self {
        Self(AtomicU8::new(Self::encode(state)))
    }

    fn get(&self) -> ReadyState {
        match self.0.load(Ordering::Acquire) {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }

    fn set(&self, state: ReadyState) {
        self.0.store(Self::encode(state), Ordering::Release);
    }

    /// Moves `Connecting` to `Open`; false if the handle already gave up.
    fn open_if_connecting(&self) -> bool {
        self.0
            .compare_exchange(
                Self::encode(ReadyState::Connecting),
                Self::encode(ReadyState::Open),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    fn encode(state: ReadyState) -> u8 {
        match state {
            ReadyState::Connecting => 0,
            ReadyState::Open => 1,
            ReadyState::Closing => 2,
            ReadyState::Closed => 3,
        }
    }
}

/// Runs one socket from handshake to close.
async fn drive_socket(
    request: Request,
    connection: ConnectionId,
    ready: Arc<SharedReadyState>,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    sink: EventSink,
) {
    let stream = match connect_async(request).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::debug!(%connection, error = %e, "WebSocket handshake failed");
            ready.set(ReadyState::Closed);
            sink.emit(connection, TransportEvent::Errored(e.to_string()));
            sink.emit(
                connection,
                TransportEvent::Closed {
                    code: Some(ABNORMAL_CLOSURE),
                    reason: String::new(),
                },
            );
            return;
        }
    };

    // close() may have run while the handshake was in flight
    if !ready.open_if_connecting() {
        return;
    }
    sink.emit(connection, TransportEvent::Opened);

    let (mut write, mut read) = stream.split();

    let (code, reason) = loop {
        tokio::select! {
            queued = outgoing.recv() => match queued {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        sink.emit(connection, TransportEvent::Errored(e.to_string()));
                        break (Some(ABNORMAL_CLOSURE), String::new());
                    }
                }
                Some(Outgoing::Close) | None => {
                    ready.set(ReadyState::Closing);
                    let frame = CloseFrame {
                        code: CloseCode::Normal,
                        reason: "client closed".into(),
                    };
                    let _ = write.send(Message::Close(Some(frame))).await;
                    break (Some(u16::from(CloseCode::Normal)), "client closed".to_string());
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    sink.emit(connection, TransportEvent::Message(text));
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => {
                        sink.emit(connection, TransportEvent::Message(text));
                    }
                    Err(_) => {
                        tracing::debug!(%connection, "Discarding non-UTF-8 binary frame");
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    ready.set(ReadyState::Closing);
                    // Flushes the close reply tungstenite queued; the peer may already be gone.
                    let _ = write.close().await;
                    break match frame {
                        Some(frame) => (Some(u16::from(frame.code)), frame.reason.into_owned()),
                        None => (None, String::new()),
                    };
                }
                // Ping/pong are answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    sink.emit(connection, TransportEvent::Errored(e.to_string()));
                    break (Some(ABNORMAL_CLOSURE), String::new());
                }
                None => break (Some(ABNORMAL_CLOSURE), String::new()),
            },
        }
    };

    ready.set(ReadyState::Closed);
    sink.emit(connection, TransportEvent::Closed { code, reason });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connection::ConnectionEvent;

    #[test]
    fn ready_state_round_trips_through_atomic() {
        let shared = SharedReadyState::new(ReadyState::Connecting);
        for state in [
            ReadyState::Open,
            ReadyState::Closing,
            ReadyState::Closed,
            ReadyState::Connecting,
        ] {
            shared.set(state);
            assert_eq!(shared.get(), state);
        }
    }

    #[test]
    fn open_only_from_connecting() {
        let shared = SharedReadyState::new(ReadyState::Connecting);
        assert!(shared.open_if_connecting());
        assert_eq!(shared.get(), ReadyState::Open);

        shared.set(ReadyState::Closed);
        assert!(!shared.open_if_connecting());
        assert_eq!(shared.get(), ReadyState::Closed);
    }

    #[tokio::test]
    async fn rejects_unparsable_url() {
        let (sink, _rx) = EventSink::channel();
        let factory = WebSocketTransportFactory::new(sink);
        let result = factory.create(ConnectionId::new(1), "not a url");
        assert!(matches!(result, Err(TransportError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn refused_connection_reports_error_then_close() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let (sink, mut rx) = EventSink::channel();
        let factory = WebSocketTransportFactory::new(sink);
        let connection = ConnectionId::new(4);
        let transport = factory
            .create(connection, &format!("ws://127.0.0.1:{}", port))
            .unwrap();

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first,
            ConnectionEvent::Transport { connection: c, event: TransportEvent::Errored(_) } if c == connection
        ));
        let second = rx.recv().await.unwrap();
        assert!(matches!(
            second,
            ConnectionEvent::Transport { event: TransportEvent::Closed { .. }, .. }
        ));
        assert_eq!(transport.ready_state(), ReadyState::Closed);
    }

    #[tokio::test]
    async fn send_before_open_is_rejected() {
        let (sink, _rx) = EventSink::channel();
        let factory = WebSocketTransportFactory::new(sink);
        let mut transport = factory
            .create(ConnectionId::new(1), "ws://127.0.0.1:9")
            .unwrap();
        assert!(matches!(transport.send_text("x"), Err(TransportError::NotOpen)));
        transport.close();
        assert_eq!(transport.ready_state(), ReadyState::Closed);
    }
}
