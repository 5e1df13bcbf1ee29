//! Session module - who is logging and whether the endpoint kept up.

mod identity;
mod status;

pub use identity::Identity;
pub use status::SessionStatus;
