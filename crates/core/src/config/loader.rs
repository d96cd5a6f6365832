//! Configuration file loader for `studio.toml`.
//!
//! This module resolves the client configuration from, in order:
//! - built-in defaults pointing at a local development backend
//! - the TOML file (`studio.toml` in the platform config directory, or an
//!   explicit path)
//! - the `STUDIO_API_URL` / `STUDIO_WS_URL` environment variables

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::ClientConfig;
use directories_next::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the REST origin.
pub const API_URL_ENV: &str = "STUDIO_API_URL";

/// Environment variable overriding the streaming origin.
pub const WS_URL_ENV: &str = "STUDIO_WS_URL";

const CONFIG_FILE_NAME: &str = "studio.toml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "VoxelVerve", "studio")
}

/// Location of `studio.toml` in the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Directory holding persisted studio state and the auth token.
pub fn default_data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Loads the client configuration.
///
/// # Arguments
///
/// * `path` - Path to a TOML configuration file
///
/// # Returns
///
/// A `ClientConfig` with file values applied over the defaults and the
/// environment applied over both. A missing file is not an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file exists but cannot be read
/// - The file is not valid TOML or has wrongly typed fields
/// - A URL does not use a scheme the client can speak
///
/// # Example
///
/// ```rust,no_run
/// use vv_core::config::loader::{default_config_path, load_config};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let path = default_config_path().unwrap_or_default();
/// let config = load_config(&path).await?;
/// println!("Talking to {}", config.api_url);
/// # Ok(())
/// # }
/// ```
pub async fn load_config(path: &Path) -> ConfigResult<ClientConfig> {
    let mut config = load_config_file(path).await?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate(&config, path)?;
    Ok(config)
}

async fn load_config_file(path: &Path) -> ConfigResult<ClientConfig> {
    // If the file doesn't exist, fall back to defaults
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(ClientConfig::default());
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Applies environment overrides using the given lookup.
pub fn apply_env_overrides(config: &mut ClientConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(api_url) = lookup(API_URL_ENV).filter(|value| !value.trim().is_empty()) {
        config.api_url = api_url.trim().to_string();
    }
    if let Some(ws_url) = lookup(WS_URL_ENV).filter(|value| !value.trim().is_empty()) {
        config.ws_url = ws_url.trim().to_string();
    }
}

fn validate(config: &ClientConfig, path: &Path) -> ConfigResult<()> {
    let invalid = |reason: String| ConfigError::InvalidConfig {
        path: path.to_path_buf(),
        reason,
    };

    if !(config.api_url.starts_with("http://") || config.api_url.starts_with("https://")) {
        return Err(invalid(format!(
            "api_url must start with http:// or https://, got {}",
            config.api_url
        )));
    }
    if !(config.ws_url.starts_with("ws://") || config.ws_url.starts_with("wss://")) {
        return Err(invalid(format!(
            "ws_url must start with ws:// or wss://, got {}",
            config.ws_url
        )));
    }
    Ok(())
}
