//! # vv-core
//!
//! Client core for the VoxelVerve studio: keeps a local studio state in
//! sync with generation runs executing on the backend.
//!
//! This crate provides:
//! - Configuration loading from `studio.toml` and the environment
//! - A typed REST gateway for prompts, runs and auth
//! - A per-run WebSocket manager with fixed-delay reconnects
//! - A pure reducer folding stream messages into run state
//! - The studio state store and its persisted snapshot
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and management
//! - [`gateway`]: REST client and credential storage
//! - [`transport`]: Run stream connection management
//! - [`state`]: Reducer, store and persistence
//! - [`sync`]: Wiring gateway, stream and store together for one run

pub mod config;
pub mod gateway;
pub mod state;
pub mod sync;
pub mod transport;
