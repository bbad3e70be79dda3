//! Error types for the API monitor service

use std::time::Duration;

/// Errors that can occur in the API monitor service
#[derive(Debug, thiserror::Error)]
pub enum ApiMonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not monitoring {0}")]
    NotMonitoring(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dashboard error: {0}")]
    Dashboard(String),
}

/// Result type alias for API monitor operations
pub type Result<T> = std::result::Result<T, ApiMonitorError>;
