//! Credential persistence.
//!
//! The bearer token lives in `<home>/credentials.json` under the fixed key
//! `token`, written with restricted permissions (0600).
//! Tokens are never logged or displayed.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::paths;

/// Key under which the token is persisted.
pub const TOKEN_KEY: &str = "token";

/// Storage slot for the single bearer credential.
///
/// Only the gateway owns an implementation of this; stores never touch it
/// directly.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored token, or `None` if nothing (or a blank value) is stored.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<Option<String>>;

    /// Replaces the stored token.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, token: &str) -> Result<()>;

    /// Removes the stored token. Clearing an empty slot succeeds.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

/// File-backed credential slot.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location under the client home.
    pub fn default_location() -> Self {
        Self::new(paths::credentials_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<CredentialFile> {
        if !self.path.exists() {
            return Ok(CredentialFile::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read credentials from {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(CredentialFile::default());
        }

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse credentials from {}", self.path.display()))
    }

    fn write_file(&self, file: &CredentialFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(file).context("Failed to serialize credentials")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut handle = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            handle
                .write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        let file = self.read_file()?;
        Ok(file.token.filter(|t| !t.trim().is_empty()))
    }

    fn save(&self, token: &str) -> Result<()> {
        self.write_file(&CredentialFile {
            token: Some(token.to_string()),
        })
    }

    fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.write_file(&CredentialFile::default())
    }
}

/// In-process credential slot, for tests and embedders without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|_poisoned| anyhow::anyhow!("credential slot lock poisoned"))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot()?.clone().filter(|t| !t.trim().is_empty()))
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot()? = None;
        Ok(())
    }
}
