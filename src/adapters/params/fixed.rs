//! Param source with fixed values.

use std::collections::HashMap;

use crate::ports::ParamSource;

/// Fixed key-value hints, for hosts without a navigation context.
#[derive(Debug, Clone, Default)]
pub struct StaticParams {
    values: HashMap<String, String>,
}

impl StaticParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ParamSource for StaticParams {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_configured_values() {
        let params = StaticParams::new().with("user", "u1");
        assert_eq!(params.get("user").as_deref(), Some("u1"));
        assert_eq!(params.get("task"), None);
    }
}
