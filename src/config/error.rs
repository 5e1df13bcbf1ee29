//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Endpoint URL must use ws:// or wss://")]
    InvalidEndpointUrl,

    #[error("Page URL is not a valid absolute URL")]
    InvalidPageUrl,

    #[error("Reconnect delay must be between 1ms and 1h")]
    InvalidReconnectDelay,

    #[error("Invalid log filter directive: {0}")]
    InvalidLogFilter(String),
}
