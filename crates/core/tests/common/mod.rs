//! Common test utilities shared by the integration tests.
//!
//! This module provides:
//! - Fixtures (runs, prompts, stream frames, client configs)
//! - Event assertions
//! - A scripted in-memory connector
//! - An in-process axum server for REST and WebSocket tests

pub mod assertions;
pub mod fixtures;
pub mod mock_connector;
pub mod mock_server;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_connector::*;
#[allow(unused_imports)]
pub use mock_server::*;
