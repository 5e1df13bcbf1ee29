//! ConnectionService - runs a [`ConnectionManager`] as a tokio actor.
//!
//! The actor owns the manager and is the only task that touches it. Callers
//! talk to it through a cloneable [`ConnectionHandle`]; transports and
//! timers report through the [`EventSink`] channel. Both mailboxes are
//! drained by one `select!` loop, so transitions never interleave.
//!
//! ## Graceful Shutdown
//!
//! [`ConnectionHandle::shutdown`] resets the manager (closing the transport
//! and cancelling any reconnect) before the actor exits. Dropping every
//! handle has the same effect.

use std::ops::ControlFlow;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::adapters::{TokioReconnectScheduler, WebSocketTransportFactory};
use crate::domain::connection::{ConnectionEvent, ConnectionState};
use crate::ports::{EventSink, ParamSource};

use super::manager::{ConnectionManager, ManagerConfig};

/// Capacity of the command mailbox.
const COMMAND_BUFFER: usize = 64;

/// Errors returned by [`ConnectionHandle`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The actor has exited; the link is gone.
    #[error("Connection service has stopped")]
    Stopped,
}

/// Point-in-time view of the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSnapshot {
    pub state: ConnectionState,
    pub is_open: bool,
    pub is_reconnecting: bool,
    pub has_save_error: bool,
    pub last_error_detail: Option<String>,
    pub user_id: Option<String>,
    pub task_id: Option<String>,
    pub last_url: Option<String>,
}

impl ConnectionSnapshot {
    fn capture(manager: &ConnectionManager) -> Self {
        Self {
            state: manager.state(),
            is_open: manager.is_open(),
            is_reconnecting: manager.is_reconnecting(),
            has_save_error: manager.has_save_error(),
            last_error_detail: manager.last_error_detail().map(str::to_string),
            user_id: manager.user_id().map(|id| id.as_str().to_string()),
            task_id: manager.task_id().map(|id| id.as_str().to_string()),
            last_url: manager.last_url().map(str::to_string),
        }
    }
}

enum Command {
    Connect {
        url: Option<String>,
        reply: oneshot::Sender<()>,
    },
    SendString {
        message: String,
        reply: oneshot::Sender<bool>,
    },
    SendActions {
        actions: Vec<Value>,
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<ConnectionSnapshot>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Spawns connection actors.
pub struct ConnectionService;

impl ConnectionService {
    /// Spawns an actor wired to the WebSocket transport and tokio timers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: ManagerConfig, params: Arc<dyn ParamSource>) -> ConnectionHandle {
        let (sink, events) = EventSink::channel();
        let manager = ConnectionManager::new(
            config,
            Box::new(WebSocketTransportFactory::new(sink.clone())),
            Box::new(TokioReconnectScheduler::new(sink)),
            params,
        );
        Self::spawn_with(manager, events)
    }

    /// Spawns an actor around an already wired manager.
    ///
    /// `events` must be the receiving end of the sink the manager's adapters
    /// report to.
    pub fn spawn_with(
        manager: ConnectionManager,
        events: mpsc::UnboundedReceiver<ConnectionEvent>,
    ) -> ConnectionHandle {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(run(manager, commands_rx, events));
        ConnectionHandle {
            commands: commands_tx,
            task: Arc::new(task),
        }
    }
}

async fn run(
    mut manager: ConnectionManager,
    mut commands: mpsc::Receiver<Command>,
    mut events: mpsc::UnboundedReceiver<ConnectionEvent>,
) {
    tracing::debug!("Connection service started");
    loop {
        tokio::select! {
            // Events first: a command observes every event emitted before it.
            biased;

            Some(event) = events.recv() => manager.handle_event(event),
            command = commands.recv() => match command {
                Some(command) => {
                    if dispatch(&mut manager, command).is_break() {
                        break;
                    }
                }
                None => {
                    manager.reset_state();
                    break;
                }
            },
        }
    }
    tracing::debug!("Connection service stopped");
}

/// Applies one command. Breaks once the actor should stop.
fn dispatch(manager: &mut ConnectionManager, command: Command) -> ControlFlow<()> {
    // A caller that gave up waiting is not an error.
    match command {
        Command::Connect { url, reply } => {
            manager.connect(url.as_deref());
            let _ = reply.send(());
        }
        Command::SendString { message, reply } => {
            let _ = reply.send(manager.send_string(&message));
        }
        Command::SendActions { actions, reply } => {
            let _ = reply.send(manager.send_actions(&actions));
        }
        Command::Snapshot { reply } => {
            let _ = reply.send(ConnectionSnapshot::capture(manager));
        }
        Command::Reset { reply } => {
            manager.reset_state();
            let _ = reply.send(());
        }
        Command::Shutdown { reply } => {
            manager.reset_state();
            let _ = reply.send(());
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

/// Cloneable async front of a connection actor.
#[derive(Clone)]
pub struct ConnectionHandle {
    commands: mpsc::Sender<Command>,
    task: Arc<JoinHandle<()>>,
}

impl ConnectionHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| ServiceError::Stopped)?;
        response.await.map_err(|_| ServiceError::Stopped)
    }

    /// See [`ConnectionManager::connect`].
    pub async fn connect(&self, url: Option<String>) -> Result<(), ServiceError> {
        self.request(|reply| Command::Connect { url, reply }).await
    }

    /// See [`ConnectionManager::send_string`].
    pub async fn send_string(&self, message: impl Into<String>) -> Result<bool, ServiceError> {
        let message = message.into();
        self.request(|reply| Command::SendString { message, reply })
            .await
    }

    /// See [`ConnectionManager::send_actions`].
    pub async fn send_actions(&self, actions: Vec<Value>) -> Result<bool, ServiceError> {
        self.request(|reply| Command::SendActions { actions, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<ConnectionSnapshot, ServiceError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn is_open(&self) -> Result<bool, ServiceError> {
        Ok(self.snapshot().await?.is_open)
    }

    pub async fn is_reconnecting(&self) -> Result<bool, ServiceError> {
        Ok(self.snapshot().await?.is_reconnecting)
    }

    pub async fn has_save_error(&self) -> Result<bool, ServiceError> {
        Ok(self.snapshot().await?.has_save_error)
    }

    pub async fn user_id(&self) -> Result<Option<String>, ServiceError> {
        Ok(self.snapshot().await?.user_id)
    }

    pub async fn task_id(&self) -> Result<Option<String>, ServiceError> {
        Ok(self.snapshot().await?.task_id)
    }

    /// See [`ConnectionManager::reset_state`].
    pub async fn reset_state(&self) -> Result<(), ServiceError> {
        self.request(|reply| Command::Reset { reply }).await
    }

    /// Tears the link down and stops the actor.
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    /// True once the actor task has exited.
    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}
