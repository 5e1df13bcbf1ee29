//! Connection lifecycle states.
//!
//! ## Transitions
//!
//! ```text
//! Closed --[connect]--> Connecting
//! Connecting --[open event]--> Open
//! Connecting | Open --[close event]--> ReconnectScheduled
//! ReconnectScheduled --[timer fires]--> Connecting
//! any --[reset]--> Closed
//! ```

use serde::Serialize;
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Readiness reported by a live transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ReadyState {
    pub fn is_open(&self) -> bool {
        matches!(self, ReadyState::Open)
    }
}

/// Lifecycle state of the link, derived from the transport's readiness and
/// the pending reconnect timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Closed,
    Connecting,
    Open,
    ReconnectScheduled,
}

impl ConnectionState {
    /// Derives the state from what the manager holds.
    ///
    /// An open transport wins over everything; a pending timer wins over a
    /// transport that is not open.
    pub fn derive(transport: Option<ReadyState>, reconnect_pending: bool) -> Self {
        match transport {
            Some(ReadyState::Open) => ConnectionState::Open,
            _ if reconnect_pending => ConnectionState::ReconnectScheduled,
            Some(ReadyState::Connecting) => ConnectionState::Connecting,
            _ => ConnectionState::Closed,
        }
    }
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Closed, Connecting)
                | (Closed, ReconnectScheduled)
                | (Connecting, Open)
                | (Connecting, ReconnectScheduled)
                | (Connecting, Closed)
                | (Open, ReconnectScheduled)
                | (Open, Closed)
                | (ReconnectScheduled, Connecting)
                | (ReconnectScheduled, Closed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Closed => vec![Connecting, ReconnectScheduled],
            Connecting => vec![Open, ReconnectScheduled, Closed],
            Open => vec![ReconnectScheduled, Closed],
            ReconnectScheduled => vec![Connecting, Closed],
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Closed => "Closed",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Open => "Open",
            ConnectionState::ReconnectScheduled => "ReconnectScheduled",
        };
        write!(f, "{}", s)
    }
}
