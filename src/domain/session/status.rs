//! Save status reported by the logging endpoint.

/// Outcome of the most recent save the endpoint reported on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatus {
    last_save_error: bool,
    last_error_detail: Option<String>,
}

impl SessionStatus {
    /// Records an explicit success indicator from the endpoint.
    ///
    /// The error detail is only kept for failures; a success clears it.
    pub fn record(&mut self, success: bool, detail: Option<String>) {
        self.last_save_error = !success;
        self.last_error_detail = if success { None } else { detail };
    }

    pub fn has_save_error(&self) -> bool {
        self.last_save_error
    }

    pub fn last_error_detail(&self) -> Option<&str> {
        self.last_error_detail.as_deref()
    }
}
