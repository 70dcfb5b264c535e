//! Error types for page checks

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageCheckError {
    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Driver failed to start: {0}")]
    DriverStartup(String),

    #[error("Driver exited unexpectedly")]
    DriverExited,

    #[error("Driver protocol error: {0}")]
    Protocol(String),

    #[error("Navigation to {target} failed: {reason}")]
    Navigation { target: String, reason: String },

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Checklist parse error: {0}")]
    ChecklistParse(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type PageCheckResult<T> = Result<T, PageCheckError>;
