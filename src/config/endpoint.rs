//! Logging endpoint configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::{ManagerConfig, DEFAULT_AUTH_KEY};

/// Upper bound for the reconnect delay (one hour).
const MAX_RECONNECT_DELAY_MS: u64 = 3_600_000;

/// Logging endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// WebSocket URL of the logging endpoint
    pub url: String,

    /// Shared token sent with every action batch
    #[serde(default = "default_auth_key")]
    pub auth_key: String,

    /// Delay before reconnecting after the connection closed, in milliseconds
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Navigation URL whose `user`/`task` query parameters seed the identity
    pub page_url: Option<String>,
}

impl EndpointConfig {
    /// Get reconnect delay as Duration
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Build the connection manager parameters
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig::default()
            .with_auth_key(self.auth_key.clone())
            .with_reconnect_delay(self.reconnect_delay())
    }

    /// Validate endpoint configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("ENDPOINT__URL"));
        }
        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(ValidationError::InvalidEndpointUrl);
        }
        if self.auth_key.is_empty() {
            return Err(ValidationError::MissingRequired("ENDPOINT__AUTH_KEY"));
        }
        if self.reconnect_delay_ms == 0 || self.reconnect_delay_ms > MAX_RECONNECT_DELAY_MS {
            return Err(ValidationError::InvalidReconnectDelay);
        }
        if let Some(page_url) = &self.page_url {
            url::Url::parse(page_url).map_err(|_| ValidationError::InvalidPageUrl)?;
        }
        Ok(())
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            auth_key: default_auth_key(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            page_url: None,
        }
    }
}

fn default_auth_key() -> String {
    DEFAULT_AUTH_KEY.to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    5000
}
