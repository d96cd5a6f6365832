//! Persisted studio snapshot.
//!
//! Only part of the studio state survives a restart: UI preferences,
//! settings, camera and prompt history. This module defines that subset as
//! its own type and reads/writes it as JSON under a fixed storage name.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use vv_protocol::prompt_models::Prompt;
use vv_protocol::studio_models::{CameraState, StudioSettings, UiState};

/// File name of the persisted snapshot inside the data directory.
pub const STORAGE_NAME: &str = "voxelverve-studio-storage.json";

/// The durable subset of the studio state.
///
/// Missing fields load as defaults; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    pub ui: UiState,
    pub settings: StudioSettings,
    pub camera: CameraState,
    pub prompt_history: Vec<Prompt>,
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to create storage directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize studio state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write studio state to {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Path of the snapshot file inside `data_dir`.
pub fn storage_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORAGE_NAME)
}

/// Load the snapshot at `path`.
///
/// A missing, unreadable or malformed file yields the default snapshot; the
/// problem is logged and the caller never sees an error.
pub fn load_snapshot(path: &Path) -> PersistedState {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no persisted studio state");
            return PersistedState::default();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read persisted studio state, using defaults");
            return PersistedState::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid persisted studio state, using defaults");
            PersistedState::default()
        }
    }
}

/// Write the snapshot to `path`, creating parent directories as needed.
///
/// The file is written to a sibling temporary file first and renamed into
/// place so a crash never leaves a half-written snapshot.
pub fn save_snapshot(path: &Path, snapshot: &PersistedState) -> PersistResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| PersistError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(snapshot)?;
    let tmp_path = path.with_extension("json.tmp");

    std::fs::write(&tmp_path, json).map_err(|source| PersistError::FileWrite {
        path: tmp_path.clone(),
        source,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|source| PersistError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "persisted studio state");
    Ok(())
}
