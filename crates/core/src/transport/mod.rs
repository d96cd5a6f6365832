//! Run stream transport.
//!
//! This module provides:
//! - The `Connector`/`Connection` seam and the `tokio-tungstenite` connector
//! - `SocketManager`, which keeps one run stream connected with fixed-delay
//!   reconnects and reports what it sees as `SocketEvent`s

pub mod connector;
pub mod error;
pub mod socket;

pub use connector::{Connection, Connector, WsConnector};
pub use error::{TransportError, TransportResult};
pub use socket::{ConnectionSnapshot, ConnectionStatus, SocketConfig, SocketEvent, SocketManager};
