use serde::{Deserialize, Serialize};

/// Failure body the API returns alongside a non-2xx status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            details: None,
        }
    }

    /// Message shown to the user; falls back when the server sent no `error` field.
    pub fn display_message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| "unknown error".to_string())
    }
}
