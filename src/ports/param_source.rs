//! ParamSource port - Read-only view of the navigation context's query.

/// Query key holding the user id hint.
pub const USER_KEY: &str = "user";

/// Query key holding the task id hint.
pub const TASK_KEY: &str = "task";

/// Key-value lookup for identity hints.
///
/// Consulted on every connect, so implementations should reflect the
/// current navigation state rather than a snapshot taken at startup.
pub trait ParamSource: Send + Sync {
    /// Returns the first value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
}
