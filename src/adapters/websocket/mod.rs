//! WebSocket adapter for the logging endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   send_text / close    ┌──────────────────────┐
//! │  ConnectionManager   │ ─────────────────────▶ │ WebSocketTransport   │
//! │  (actor task)        │                        │ (handle)             │
//! └──────────────────────┘                        └──────────────────────┘
//!            ▲                                               │ mpsc
//!            │ ConnectionEvent                               ▼
//! ┌──────────────────────┐   Opened/Message/...   ┌──────────────────────┐
//! │      EventSink       │ ◀───────────────────── │ drive_socket task    │
//! └──────────────────────┘                        │ (tokio-tungstenite)  │
//!                                                 └──────────────────────┘
//! ```

mod transport;

pub use transport::{WebSocketTransport, WebSocketTransportFactory};
