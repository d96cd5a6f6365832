//! Client configuration loading and management.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::{default_config_path, default_data_dir, load_config};
pub use models::ClientConfig;
