//! Error types for REST requests.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the REST gateway.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The server answered 2xx but the envelope reported failure.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The body could not be decoded or carried no data.
    #[error("Invalid response: {0}")]
    Parse(String),

    /// No response was received (connection refused, timeout, DNS).
    #[error("Cannot reach server: {0}")]
    Connectivity(String),

    /// The auth token could not be written or removed.
    #[error("Failed to update credentials at {path}: {source}")]
    Credentials {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ApiError {
    /// Map a non-2xx response body to an error.
    ///
    /// Uses the body's `error` string, then its `message`, and falls back
    /// to `HTTP <status>` when the body has neither or is not JSON.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["error", "message"].iter().find_map(|key| {
                    value
                        .get(key)
                        .and_then(|field| field.as_str())
                        .map(str::to_string)
                })
            })
            .unwrap_or_else(|| format!("HTTP {status}"));

        Self::Http { status, message }
    }

    /// HTTP status for `Http` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Type alias for Result with ApiError.
pub type ApiResult<T> = Result<T, ApiError>;
