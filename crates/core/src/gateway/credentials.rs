//! File-backed auth token storage.

use std::path::{Path, PathBuf};

use crate::gateway::error::{ApiError, ApiResult};

/// File name of the stored token inside the data directory.
pub const TOKEN_FILE_NAME: &str = "auth_token";

/// Holds the bearer token between invocations.
///
/// The token is re-read on every request, so a login in one process is
/// picked up by another without restarting it.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store the token in `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(TOKEN_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored token, if any. Blank files count as no token.
    pub fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(token) => {
                let token = token.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read auth token");
                None
            }
        }
    }

    pub fn save(&self, token: &str) -> ApiResult<()> {
        let to_error = |source| ApiError::Credentials {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(to_error)?;
        }
        std::fs::write(&self.path, token).map_err(to_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(to_error)?;
        }
        Ok(())
    }

    /// Remove the stored token. Removing a missing token is not an error.
    pub fn clear(&self) -> ApiResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ApiError::Credentials {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_load_clear() {
        let dir = tempdir().expect("Failed to create temp dir");
        let store = CredentialStore::new(&dir.path().join("data"));

        assert!(store.load().is_none());

        store.save("tok-123").expect("Failed to save token");
        assert_eq!(store.load().as_deref(), Some("tok-123"));

        store.clear().expect("Failed to clear token");
        assert!(store.load().is_none());
        store.clear().expect("Clearing twice should succeed");
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let dir = tempdir().expect("Failed to create temp dir");
        let store = CredentialStore::new(dir.path());
        std::fs::write(store.path(), "  \n").expect("Failed to write token file");

        assert!(store.load().is_none());
    }
}
