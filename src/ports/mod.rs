//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the connection manager and the outside world. Adapters implement these
//! ports.
//!
//! - `Transport` / `TransportFactory` - The socket carrying frames to the endpoint
//! - `ReconnectScheduler` / `ScheduledTask` - Cancellable single-shot timers
//! - `ParamSource` - Identity hints from the navigation context
//! - `EventSink` - Channel through which adapters report back

mod event_sink;
mod param_source;
mod reconnect_scheduler;
mod transport;

pub use event_sink::EventSink;
pub use param_source::{ParamSource, TASK_KEY, USER_KEY};
pub use reconnect_scheduler::{ReconnectScheduler, ScheduledTask};
pub use transport::{Transport, TransportError, TransportFactory};
