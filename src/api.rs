use serde::{Deserialize, Serialize};

/// Result of a save, shared by the HTTP endpoint and the native host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResponse {
    pub fn saved(bookmark_id: i64) -> Self {
        SaveResponse {
            success: true,
            bookmark_id: Some(bookmark_id),
            error: None,
        }
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        SaveResponse {
            success: false,
            bookmark_id: None,
            error: Some(msg.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        HealthResponse {
            status: "ok",
            message: "Desktop app is running",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: &str) -> Self {
        ErrorResponse { error: msg.to_owned() }
    }
}
