//! Manually fired reconnect scheduler for testing.
//!
//! Nothing fires on its own: tests inspect what was scheduled and deliver
//! `ConnectionEvent::ReconnectDue` to the manager when they choose.
//!
//! # Security Note
//!
//! This adapter is for **testing only**. It uses `.expect()` on lock
//! operations which will panic if locks are poisoned.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::domain::foundation::TimerId;
use crate::ports::{ReconnectScheduler, ScheduledTask};

#[derive(Debug, Default)]
struct SchedulerState {
    scheduled: Vec<(TimerId, Duration)>,
    cancelled: Vec<TimerId>,
}

/// Scheduler that only records.
///
/// # Panics
///
/// Methods may panic if the internal lock is poisoned.
#[derive(Debug, Clone, Default)]
pub struct ManualReconnectScheduler {
    state: Arc<Mutex<SchedulerState>>,
}

impl ManualReconnectScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state
            .lock()
            .expect("ManualReconnectScheduler: lock poisoned")
    }

    // === Test Helpers ===

    /// Every timer ever scheduled with its delay, oldest first.
    pub fn scheduled(&self) -> Vec<(TimerId, Duration)> {
        self.lock().scheduled.clone()
    }

    /// Timers that were scheduled and not yet cancelled.
    pub fn active(&self) -> Vec<TimerId> {
        let state = self.lock();
        state
            .scheduled
            .iter()
            .map(|(timer, _)| *timer)
            .filter(|timer| !state.cancelled.contains(timer))
            .collect()
    }

    /// The most recently scheduled timer.
    pub fn latest(&self) -> Option<TimerId> {
        self.lock().scheduled.last().map(|(timer, _)| *timer)
    }

    pub fn was_cancelled(&self, timer: TimerId) -> bool {
        self.lock().cancelled.contains(&timer)
    }
}

impl ReconnectScheduler for ManualReconnectScheduler {
    fn schedule(&self, timer: TimerId, delay: Duration) -> Box<dyn ScheduledTask> {
        self.lock().scheduled.push((timer, delay));
        Box::new(ManualTask {
            timer,
            state: Arc::clone(&self.state),
        })
    }
}

struct ManualTask {
    timer: TimerId,
    state: Arc<Mutex<SchedulerState>>,
}

impl ScheduledTask for ManualTask {
    fn cancel(&mut self) {
        let mut state = self.state.lock().expect("ManualTask: lock poisoned");
        if !state.cancelled.contains(&self.timer) {
            state.cancelled.push(self.timer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_active_timers() {
        let scheduler = ManualReconnectScheduler::new();
        let mut first = scheduler.schedule(TimerId::new(1), Duration::from_secs(5));
        scheduler.schedule(TimerId::new(2), Duration::from_secs(5));

        first.cancel();
        first.cancel();

        assert_eq!(scheduler.active(), vec![TimerId::new(2)]);
        assert!(scheduler.was_cancelled(TimerId::new(1)));
        assert_eq!(scheduler.latest(), Some(TimerId::new(2)));
        assert_eq!(scheduler.scheduled().len(), 2);
    }
}
