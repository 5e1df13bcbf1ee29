//! Session identity reported to the logging endpoint.

use crate::domain::foundation::{TaskId, UserId};

/// The (user, task) pair identifying the current session.
///
/// Both halves are optional: a session may start anonymous and receive a
/// user id from the endpoint later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    user_id: Option<UserId>,
    task_id: Option<TaskId>,
}

impl Identity {
    pub fn new(user_id: Option<UserId>, task_id: Option<TaskId>) -> Self {
        Self { user_id, task_id }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }

    /// Overwrites each field for which a non-empty hint is supplied.
    ///
    /// Missing or empty hints keep the current value. Present hints always
    /// win, so a navigation to a page with different parameters takes effect
    /// on the next (re)connect.
    pub fn refresh(&mut self, user_hint: Option<String>, task_hint: Option<String>) {
        if let Some(user_id) = user_hint.and_then(|hint| UserId::new(hint).ok()) {
            self.user_id = Some(user_id);
        }
        if let Some(task_id) = task_hint.and_then(|hint| TaskId::new(hint).ok()) {
            self.task_id = Some(task_id);
        }
    }

    /// Replaces the user id with the one handed out by the endpoint.
    pub fn replace_user_id(&mut self, user_id: Option<UserId>) {
        self.user_id = user_id;
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.task_id.is_none()
    }
}
