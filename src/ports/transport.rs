//! Transport port - Interface for the bidirectional text channel.
//!
//! A transport is created per connection attempt by a [`TransportFactory`].
//! It reports its lifecycle asynchronously through the
//! [`EventSink`](super::EventSink) it was wired with, tagging every event
//! with the [`ConnectionId`] it was created for:
//!
//! ```text
//! create ──> Opened ──> Message* ──> [Errored] ──> Closed
//!        └─────────────────────────> [Errored] ──> Closed
//! ```
//!
//! `Errored` is always followed by `Closed`; reconnection is driven by the
//! latter.

use thiserror::Error;

use crate::domain::connection::ReadyState;
use crate::domain::foundation::ConnectionId;

/// Errors raised synchronously by a transport or its factory.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The URL cannot be turned into a connection request.
    #[error("Invalid endpoint URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A write was attempted on a transport that is not open.
    #[error("Transport is not open")]
    NotOpen,

    /// The task driving the transport has gone away.
    #[error("Transport channel closed")]
    ChannelClosed,
}

/// A live (or dying) connection to the endpoint.
pub trait Transport: Send {
    /// Current readiness of the underlying channel.
    fn ready_state(&self) -> ReadyState;

    /// Queues a text frame for sending.
    ///
    /// Fire-and-forget: `Ok` means the write was accepted, not that the
    /// endpoint received it.
    fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// Requests the channel to close. Safe to call more than once.
    fn close(&mut self);
}

/// Creates transports bound to a URL.
pub trait TransportFactory: Send {
    /// Starts connecting to `url`.
    ///
    /// Returns immediately; the outcome is reported through events tagged
    /// with `connection`.
    fn create(
        &self,
        connection: ConnectionId,
        url: &str,
    ) -> Result<Box<dyn Transport>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_error_names_the_url() {
        let err = TransportError::InvalidUrl {
            url: "nope".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid endpoint URL 'nope': relative URL without a base"
        );
    }
}
