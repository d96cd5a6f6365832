//! REST gateway.
//!
//! Typed request wrappers for prompts, runs and auth, plus the file that
//! keeps the bearer token between invocations.

pub mod client;
pub mod credentials;
pub mod error;

pub use client::ApiClient;
pub use credentials::CredentialStore;
pub use error::{ApiError, ApiResult};
