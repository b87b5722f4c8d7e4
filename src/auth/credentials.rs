//! Credential Storage
//!
//! Where the bearer token lives between runs. The file store keeps it under
//! the user's config directory; the memory store keeps it for the lifetime
//! of the process only.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::api::AccessToken;

/// Persistent home of the bearer token
pub trait CredentialStore: Send + Sync {
    /// Read the stored token, if any
    fn load(&self) -> Result<Option<AccessToken>, CredentialError>;

    /// Replace the stored token
    fn save(&mut self, token: &AccessToken) -> Result<(), CredentialError>;

    /// Remove the stored token. Removing an absent token is not an error.
    fn clear(&mut self) -> Result<(), CredentialError>;
}

/// Errors raised by credential stores
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to access credential file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Default token location: `<config_dir>/mindcare/token`
pub fn default_token_path() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("mindcare").join("token"))
        .unwrap_or_else(|| PathBuf::from(".mindcare_token"))
}

/// Token kept in a file
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CredentialError {
        CredentialError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for FileCredentialStore {
    fn default() -> Self {
        Self::new(default_token_path())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<AccessToken>, CredentialError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(AccessToken::new(token)))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&mut self, token: &AccessToken) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        std::fs::write(&self.path, token.as_str()).map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }

        Ok(())
    }

    fn clear(&mut self) -> Result<(), CredentialError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Token kept in memory only
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    token: Option<AccessToken>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds a token, as if left by an earlier run
    pub fn with_token(token: AccessToken) -> Self {
        Self { token: Some(token) }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<AccessToken>, CredentialError> {
        Ok(self.token.clone())
    }

    fn save(&mut self, token: &AccessToken) -> Result<(), CredentialError> {
        self.token = Some(token.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CredentialError> {
        self.token = None;
        Ok(())
    }
}
