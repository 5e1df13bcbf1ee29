//! In-memory adapters for deterministic tests of the connection lifecycle.

mod scheduler;
mod transport;

pub use scheduler::ManualReconnectScheduler;
pub use transport::{ChannelRecord, InMemoryTransportFactory};
