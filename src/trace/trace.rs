use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::engine::session::LoadStatus;

/// One line of the resolution trace: what happened to a field's options.
#[derive(Debug, Serialize)]
pub struct ResolutionEvent {
    pub timestamp_ms: u128,
    pub field_id: String,
    pub field_name: String,
    pub generation: u64,

    pub status: String,

    pub url: Option<String>,
    pub parent_value: Option<String>,
    pub option_count: Option<usize>,
    pub error: Option<String>,
}

impl ResolutionEvent {
    pub fn now(field_id: &str, field_name: &str, generation: u64, status: LoadStatus) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            field_id: field_id.to_string(),
            field_name: field_name.to_string(),
            generation,
            status: status.as_str().to_string(),
            url: None,
            parent_value: None,
            option_count: None,
            error: None,
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn with_parent(mut self, parent_value: Option<&str>) -> Self {
        self.parent_value = parent_value.map(str::to_string);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.option_count = Some(count);
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Marks a completion that arrived after a newer request superseded it.
    pub fn discarded(mut self) -> Self {
        self.status = "discarded".to_string();
        self
    }
}
