//! Domain layer containing the link's vocabulary and rules.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (identifiers, errors, state machine trait)
//! - `session` - Identity and save status of the logging session
//! - `connection` - Lifecycle states, events and URL construction
//! - `envelope` - JSON envelopes exchanged with the endpoint

pub mod connection;
pub mod envelope;
pub mod foundation;
pub mod session;
