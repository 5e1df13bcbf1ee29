//! Application layer - the connection manager and the actor that drives it.
//!
//! - `ConnectionManager` - Synchronous lifecycle state machine
//! - `ConnectionService` / `ConnectionHandle` - Tokio actor and its async API

mod manager;
mod service;

pub use manager::{ConnectionManager, ManagerConfig, DEFAULT_AUTH_KEY, DEFAULT_RECONNECT_DELAY};
pub use service::{ConnectionHandle, ConnectionService, ConnectionSnapshot, ServiceError};
