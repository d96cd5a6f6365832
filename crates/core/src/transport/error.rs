//! Error types for the run stream transport.

use thiserror::Error;

/// Errors raised by stream connections and the socket manager.
#[derive(Error, Debug)]
pub enum TransportError {
    /// `send` was called while no connection is open.
    #[error("WebSocket is not connected")]
    NotConnected,

    /// The connection could not be established.
    #[error("Failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    /// The open connection reported a protocol or I/O failure.
    #[error("WebSocket error: {0}")]
    Protocol(String),

    /// An outbound frame could not be written.
    #[error("Failed to send frame: {0}")]
    Send(String),

    /// An outbound payload could not be serialized.
    #[error("Failed to serialize outbound message: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Type alias for Result with TransportError.
pub type TransportResult<T> = Result<T, TransportError>;
