//! ConnectionManager - the connection lifecycle state machine.
//!
//! Owns the single transport handle, the single reconnect timer and the
//! session state. Every transition happens synchronously inside one of its
//! methods, so the manager needs no locking; [`ConnectionService`] drives it
//! from a single task.
//!
//! [`ConnectionService`]: super::ConnectionService

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use tracing::{debug, error, info, trace, warn};

use crate::domain::connection::{
    connection_url, ConnectionEvent, ConnectionState, ReadyState, TransportEvent,
};
use crate::domain::envelope::{ActionEnvelope, EndpointResponse, UserIdUpdate};
use crate::domain::foundation::{ConnectionId, StateMachine, TaskId, TimerId, UserId};
use crate::domain::session::{Identity, SessionStatus};
use crate::ports::{
    ParamSource, ReconnectScheduler, ScheduledTask, Transport, TransportFactory, TASK_KEY,
    USER_KEY,
};

/// Default shared token sent with every action batch.
pub const DEFAULT_AUTH_KEY: &str = "notthatsecret";

/// Default wait between a close and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

/// Deployment parameters of the manager.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Shared token placed in every action envelope.
    pub auth_key: Secret<String>,

    /// Delay before a reconnect attempt after the transport closed.
    pub reconnect_delay: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            auth_key: Secret::new(DEFAULT_AUTH_KEY.to_string()),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl ManagerConfig {
    pub fn with_auth_key(mut self, auth_key: impl Into<String>) -> Self {
        self.auth_key = Secret::new(auth_key.into());
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

struct ActiveTransport {
    id: ConnectionId,
    handle: Box<dyn Transport>,
}

struct PendingReconnect {
    timer: TimerId,
    task: Box<dyn ScheduledTask>,
}

/// Client-side manager for the single connection to the logging endpoint.
pub struct ConnectionManager {
    config: ManagerConfig,
    factory: Box<dyn TransportFactory>,
    scheduler: Box<dyn ReconnectScheduler>,
    params: Arc<dyn ParamSource>,

    transport: Option<ActiveTransport>,
    reconnect: Option<PendingReconnect>,
    last_url: Option<String>,
    identity: Identity,
    status: SessionStatus,

    next_connection: ConnectionId,
    next_timer: TimerId,
}

impl ConnectionManager {
    pub fn new(
        config: ManagerConfig,
        factory: Box<dyn TransportFactory>,
        scheduler: Box<dyn ReconnectScheduler>,
        params: Arc<dyn ParamSource>,
    ) -> Self {
        Self {
            config,
            factory,
            scheduler,
            params,
            transport: None,
            reconnect: None,
            last_url: None,
            identity: Identity::default(),
            status: SessionStatus::default(),
            next_connection: ConnectionId::new(1),
            next_timer: TimerId::new(1),
        }
    }

    // === Connection lifecycle ===

    /// Connects to the endpoint unless the current link is healthy.
    ///
    /// A non-empty `url` is remembered for later reconnects; without one the
    /// remembered URL is used, and without either nothing happens. Any
    /// pending reconnect is cancelled first.
    pub fn connect(&mut self, url: Option<&str>) {
        let before = self.state();
        self.cancel_reconnect();

        if self.is_open() {
            debug!("Connection already open, not reconnecting");
            return;
        }

        let base = match url.filter(|u| !u.is_empty()) {
            Some(url) => {
                self.last_url = Some(url.to_string());
                url.to_string()
            }
            None => match &self.last_url {
                Some(url) => url.clone(),
                None => {
                    debug!("No endpoint URL to connect to");
                    self.observe_transition(before);
                    return;
                }
            },
        };

        self.identity
            .refresh(self.params.get(USER_KEY), self.params.get(TASK_KEY));
        let target = connection_url(&base, &self.identity);

        self.retire_transport();
        let id = self.allocate_connection_id();
        match self.factory.create(id, &target) {
            Ok(handle) => {
                info!(connection = %id, url = %target, "Connecting to logging endpoint");
                self.transport = Some(ActiveTransport { id, handle });
            }
            Err(e) => {
                warn!(connection = %id, error = %e, "Could not create transport");
                self.schedule_reconnect();
            }
        }

        self.observe_transition(before);
    }

    /// Feeds one lifecycle event into the state machine.
    pub fn handle_event(&mut self, event: ConnectionEvent) {
        let before = self.state();
        match event {
            ConnectionEvent::Transport { connection, event } => {
                if self.transport.as_ref().map(|t| t.id) != Some(connection) {
                    trace!(%connection, ?event, "Ignoring event from retired transport");
                    return;
                }
                self.on_transport_event(connection, event);
            }
            ConnectionEvent::ReconnectDue(timer) => self.on_reconnect_due(timer),
        }
        self.observe_transition(before);
    }

    fn on_transport_event(&mut self, connection: ConnectionId, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                info!(%connection, "WebSocket connected");
            }
            TransportEvent::Message(text) => {
                debug!(%connection, message = %text, "Received message");
                self.handle_response(&text);
            }
            TransportEvent::Errored(reason) => {
                error!(%connection, %reason, "WebSocket error");
            }
            TransportEvent::Closed { code, reason } => {
                info!(%connection, ?code, %reason, "WebSocket closed");
                // The close event is authoritative over the handle's own flag.
                self.transport = None;
                self.schedule_reconnect();
            }
        }
    }

    fn on_reconnect_due(&mut self, timer: TimerId) {
        match self.reconnect.take() {
            Some(mut pending) if pending.timer == timer => {
                pending.task.cancel();
                debug!(%timer, "Reconnect timer fired");
                self.connect(None);
            }
            other => {
                self.reconnect = other;
                trace!(%timer, "Ignoring stale reconnect timer");
            }
        }
    }

    /// Applies a response from the endpoint. Malformed frames change nothing.
    fn handle_response(&mut self, text: &str) {
        let response = match EndpointResponse::parse(text) {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Discarding message from endpoint");
                return;
            }
        };

        if let Some(success) = response.success {
            if !success {
                warn!(
                    error = response.error.as_deref().unwrap_or("undefined"),
                    "Actions not saved on endpoint"
                );
            }
            self.status.record(success, response.error);
        }

        if let UserIdUpdate::Replace(user_id) = response.user_id {
            debug!(user_id = ?user_id.as_ref().map(UserId::as_str), "Endpoint assigned user id");
            self.identity.replace_user_id(user_id);
        }
    }

    fn schedule_reconnect(&mut self) {
        if self.reconnect.is_some() {
            debug!("Reconnect already scheduled");
            return;
        }

        let timer = self.allocate_timer_id();
        let delay = self.config.reconnect_delay;
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        info!(%timer, delay_ms, "Retrying connection after delay");
        let task = self.scheduler.schedule(timer, delay);
        self.reconnect = Some(PendingReconnect { timer, task });
    }

    fn cancel_reconnect(&mut self) {
        if let Some(mut pending) = self.reconnect.take() {
            debug!(timer = %pending.timer, "Cancelling pending reconnect");
            pending.task.cancel();
        }
    }

    /// Closes and forgets the current transport, if any.
    fn retire_transport(&mut self) {
        if let Some(mut active) = self.transport.take() {
            if active.handle.ready_state() != ReadyState::Closed {
                debug!(connection = %active.id, "Closing superseded transport");
            }
            active.handle.close();
        }
    }

    fn allocate_connection_id(&mut self) -> ConnectionId {
        let id = self.next_connection;
        self.next_connection = id.next();
        id
    }

    fn allocate_timer_id(&mut self) -> TimerId {
        let id = self.next_timer;
        self.next_timer = id.next();
        id
    }

    fn observe_transition(&self, before: ConnectionState) {
        let after = self.state();
        if before == after {
            return;
        }
        if before.can_transition_to(&after) {
            debug!(from = %before, to = %after, "Connection state changed");
        } else {
            warn!(from = %before, to = %after, "Unexpected connection state change");
        }
    }

    // === Sending ===

    /// Sends a raw string.
    ///
    /// Returns false when the link is not open or the write was refused,
    /// otherwise whether the link is still open right after the write.
    pub fn send_string(&mut self, message: &str) -> bool {
        let Some(active) = self.transport.as_mut() else {
            return false;
        };
        if !active.handle.ready_state().is_open() {
            return false;
        }
        if let Err(e) = active.handle.send_text(message) {
            warn!(connection = %active.id, error = %e, "Failed to send message");
            return false;
        }
        self.is_open()
    }

    /// Sends a batch of user actions wrapped with the shared token.
    pub fn send_actions(&mut self, actions: &[Value]) -> bool {
        if !self.is_open() {
            return false;
        }
        let payload = ActionEnvelope::new(self.config.auth_key.expose_secret(), actions).to_json();
        match payload {
            Ok(payload) => self.send_string(&payload),
            Err(e) => {
                warn!(error = %e, "Failed to serialize actions");
                false
            }
        }
    }

    // === Queries ===

    pub fn is_open(&self) -> bool {
        self.transport
            .as_ref()
            .is_some_and(|t| t.handle.ready_state().is_open())
    }

    pub fn is_reconnecting(&self) -> bool {
        self.reconnect.is_some()
    }

    pub fn has_save_error(&self) -> bool {
        self.status.has_save_error()
    }

    /// Error detail of the last failed save, cleared by a successful one.
    pub fn last_error_detail(&self) -> Option<&str> {
        self.status.last_error_detail()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.identity.user_id()
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        self.identity.task_id()
    }

    pub fn last_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::derive(
            self.transport.as_ref().map(|t| t.handle.ready_state()),
            self.reconnect.is_some(),
        )
    }

    // === Teardown ===

    /// Returns the manager to its initial state.
    ///
    /// The transport is asked to close before it is dropped; its remaining
    /// events are ignored.
    pub fn reset_state(&mut self) {
        let before = self.state();
        self.identity = Identity::default();
        self.retire_transport();
        self.cancel_reconnect();
        self.last_url = None;
        self.status = SessionStatus::default();
        self.observe_transition(before);
    }
}
