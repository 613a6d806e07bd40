//! Unified error type for the quotefeed workspace.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Provider error (status={status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Snapshot store error: {0}")]
    Snapshot(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
