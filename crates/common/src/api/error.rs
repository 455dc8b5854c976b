use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fixed user-visible error body shape (§7).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_code: String,
    pub message: String,
    pub details: ErrorDetails,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(flatten)]
    pub context: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ErrorBody {
    pub fn new(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.to_string(),
            message: message.into(),
            details: ErrorDetails::default(),
        }
    }

    pub fn with_context(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.context.insert(key.to_string(), value.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.details.suggestion = Some(suggestion.into());
        self
    }
}
