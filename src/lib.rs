//! Action Log Link - persistent WebSocket link to an action-logging endpoint
//!
//! This crate keeps a single connection to a remote logging endpoint open,
//! tags it with the user and task identity, ships batches of user actions as
//! JSON, reconnects after a fixed delay when the link drops, and tracks the
//! endpoint's save status and user id reassignments.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod logging;
pub mod ports;
