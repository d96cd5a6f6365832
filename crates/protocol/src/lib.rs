//! # vv-protocol
//!
//! Wire definitions and data models shared by the VoxelVerve studio client.
//!
//! This crate defines all data structures used for:
//! - Generation runs and their stages, as returned by the REST API
//! - The run progress stream delivered over WebSocket
//! - Prompts, users and the REST response envelope
//! - Studio preferences that are persisted between sessions
//!
//! ## Modules
//!
//! - [`run_models`]: Runs, stages and their status vocabularies
//! - [`transport`]: Inbound stream messages for a single run
//! - [`prompt_models`]: Prompts and generation parameters
//! - [`auth_models`]: Users and auth sessions
//! - [`api_models`]: REST envelope, pagination and request bodies
//! - [`studio_models`]: UI, camera, viewport, selection and settings state
//!
//! ## Design Principles
//!
//! - Minimal dependencies: only serde, chrono and ts-rs
//! - TypeScript generation: model types derive `TS` so the studio views
//!   can share the exact shapes
//! - camelCase on the wire, matching the studio frontend

pub mod api_models;
pub mod auth_models;
pub mod prompt_models;
pub mod run_models;
pub mod studio_models;
pub mod transport;

// Re-export all public types for convenience
pub use api_models::*;
pub use auth_models::*;
pub use prompt_models::*;
pub use run_models::*;
pub use studio_models::*;
pub use transport::*;
