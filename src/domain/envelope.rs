//! Wire envelopes exchanged with the logging endpoint.
//!
//! - Client → Endpoint: `{ "authKey": ..., "userActions": [...] }`
//! - Endpoint → Client: a JSON object with optional `success`, `error` and
//!   `newUserId` fields

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::foundation::UserId;

// ============================================
// Client → Endpoint
// ============================================

/// Batch of user actions, authorised with the shared token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEnvelope<'a> {
    pub auth_key: &'a str,
    pub user_actions: &'a [Value],
}

impl<'a> ActionEnvelope<'a> {
    pub fn new(auth_key: &'a str, user_actions: &'a [Value]) -> Self {
        Self {
            auth_key,
            user_actions,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================
// Endpoint → Client
// ============================================

/// Why an inbound frame was discarded.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("message is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("message is not a JSON object")]
    NotAnObject,
}

/// What a response says about the user id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UserIdUpdate {
    #[default]
    Unchanged,
    /// Overwrite the current user id. `None` when the endpoint sent an
    /// empty or null id.
    Replace(Option<UserId>),
}

/// Parsed response from the logging endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndpointResponse {
    /// Explicit save outcome. `None` leaves the save status untouched.
    pub success: Option<bool>,
    /// Error detail accompanying a failed save.
    pub error: Option<String>,
    pub user_id: UserIdUpdate,
}

impl EndpointResponse {
    /// Parses a text frame.
    ///
    /// Only a boolean `success` counts as a save outcome; any other value
    /// under that key is ignored. `newUserId` accepts a string, a number or
    /// null; other types leave the user id unchanged.
    pub fn parse(text: &str) -> Result<Self, ResponseError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(object) => Ok(Self::from_object(&object)),
            _ => Err(ResponseError::NotAnObject),
        }
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        let error = object.get("error").map(|detail| match detail {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

        let user_id = match object.get("newUserId") {
            None => UserIdUpdate::Unchanged,
            Some(Value::Null) => UserIdUpdate::Replace(None),
            Some(Value::String(s)) => UserIdUpdate::Replace(UserId::new(s.as_str()).ok()),
            Some(Value::Number(n)) => UserIdUpdate::Replace(UserId::new(n.to_string()).ok()),
            Some(_) => UserIdUpdate::Unchanged,
        };

        Self {
            success: object.get("success").and_then(Value::as_bool),
            error,
            user_id,
        }
    }
}
