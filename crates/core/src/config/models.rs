//! Configuration model for the studio client.
//!
//! This module provides the `ClientConfig` structure that tells the client
//! where the backend lives and how patient the run stream should be.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::transport::socket::SocketConfig;

/// Default REST origin of a local development backend.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default streaming origin of a local development backend.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000";

/// Client configuration loaded from `studio.toml`.
///
/// Every field is optional in the file; missing fields take the defaults
/// below.
///
/// # Example
///
/// ```toml
/// # studio.toml
/// api_url = "https://studio.example.com"
/// ws_url = "wss://studio.example.com"
/// reconnect_interval_ms = 2000
/// max_reconnect_attempts = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base REST origin; `/api/v1` is appended per request.
    pub api_url: String,

    /// Base streaming origin; run streams live at `{ws_url}/runs/{id}`.
    pub ws_url: String,

    /// Per-request timeout for REST calls.
    pub request_timeout_secs: u64,

    /// Fixed delay between reconnect attempts.
    pub reconnect_interval_ms: u64,

    /// Reconnect attempts before the stream gives up.
    pub max_reconnect_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            request_timeout_secs: 30,
            reconnect_interval_ms: 5_000,
            max_reconnect_attempts: 5,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Socket settings derived from this configuration.
    pub fn socket_config(&self) -> SocketConfig {
        SocketConfig {
            reconnect_interval: Duration::from_millis(self.reconnect_interval_ms),
            max_reconnect_attempts: self.max_reconnect_attempts,
        }
    }

    /// Stream URL for a single run.
    pub fn run_stream_url(&self, run_id: &str) -> String {
        format!("{}/runs/{run_id}", self.ws_url.trim_end_matches('/'))
    }
}
