//! Reconnect timers on the tokio clock.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::domain::foundation::TimerId;
use crate::ports::{EventSink, ReconnectScheduler, ScheduledTask};

/// Schedules reconnects as sleeping tokio tasks.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioReconnectScheduler {
    sink: EventSink,
}

impl TokioReconnectScheduler {
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }
}

impl ReconnectScheduler for TokioReconnectScheduler {
    fn schedule(&self, timer: TimerId, delay: Duration) -> Box<dyn ScheduledTask> {
        let sink = self.sink.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sink.reconnect_due(timer);
        });
        Box::new(TokioScheduledTask { handle })
    }
}

/// Aborts the sleeping task on cancel or drop.
struct TokioScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask for TokioScheduledTask {
    fn cancel(&mut self) {
        self.handle.abort();
    }
}

impl Drop for TokioScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
