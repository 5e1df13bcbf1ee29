//! actionlog-relay: forwards NDJSON action batches from stdin to the logging endpoint.
//!
//! Each input line is either a JSON array of actions or a single action
//! object. Lines are sent as they arrive; a line that cannot be sent because
//! the link is down is dropped with a warning.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};

use actionlog_link::adapters::{PageUrlParams, StaticParams};
use actionlog_link::application::{ConnectionHandle, ConnectionService};
use actionlog_link::config::AppConfig;
use actionlog_link::ports::ParamSource;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    actionlog_link::logging::init(&config.logging);

    let params: Arc<dyn ParamSource> = match &config.endpoint.page_url {
        Some(page_url) => Arc::new(PageUrlParams::new(page_url)?),
        None => Arc::new(StaticParams::new()),
    };

    let handle = ConnectionService::spawn(config.endpoint.manager_config(), params);
    handle.connect(Some(config.endpoint.url.clone())).await?;
    tracing::info!(endpoint = %config.endpoint.url, "Relay started");

    tokio::select! {
        result = relay_stdin(&handle) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
    }

    handle.shutdown().await?;
    tracing::info!("Relay stopped");
    Ok(())
}

async fn relay_stdin(handle: &ConnectionHandle) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let Some(actions) = parse_actions(&line) else {
            if !line.trim().is_empty() {
                tracing::warn!(line = %line, "Skipping line that is not a JSON action batch");
            }
            continue;
        };

        if !handle.send_actions(actions).await? {
            tracing::warn!("Link not open, dropping action batch");
        }
    }

    Ok(())
}

/// Parse one input line into an action batch.
fn parse_actions(line: &str) -> Option<Vec<Value>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(line).ok()? {
        Value::Array(actions) => Some(actions),
        action @ Value::Object(_) => Some(vec![action]),
        _ => None,
    }
}
