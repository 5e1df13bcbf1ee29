//! Connection module - lifecycle states, events and endpoint addressing.

mod endpoint;
mod events;
mod state;

pub use endpoint::{connection_url, TASK_ID_PARAM, USER_ID_PARAM};
pub use events::{ConnectionEvent, TransportEvent};
pub use state::{ConnectionState, ReadyState};
