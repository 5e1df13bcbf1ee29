//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the connection manager to external systems:
//! - `websocket` - tokio-tungstenite transport to the logging endpoint
//! - `scheduler` - Reconnect timers on the tokio clock
//! - `params` - Identity hints from a page URL or fixed values
//! - `in_memory` - Deterministic doubles for tests

pub mod in_memory;
pub mod params;
pub mod scheduler;
pub mod websocket;

pub use params::{PageUrlParams, StaticParams};
pub use scheduler::TokioReconnectScheduler;
pub use websocket::{WebSocketTransport, WebSocketTransportFactory};
