//! ReconnectScheduler port - Interface for single-shot delayed retries.
//!
//! The manager keeps at most one [`ScheduledTask`] at a time. Cancelling it
//! (or dropping it) must guarantee the timer no longer fires; a fire that
//! races with cancellation is still filtered by its [`TimerId`].

use std::time::Duration;

use crate::domain::foundation::TimerId;

/// Handle to a pending reconnect timer.
pub trait ScheduledTask: Send {
    /// Cancels the timer. Safe to call when it already fired.
    fn cancel(&mut self);
}

/// Creates reconnect timers.
pub trait ReconnectScheduler: Send {
    /// Arranges for `ConnectionEvent::ReconnectDue(timer)` to be delivered
    /// after `delay`.
    fn schedule(&self, timer: TimerId, delay: Duration) -> Box<dyn ScheduledTask>;
}
