//! Durable storage for the JWT token pair.
//!
//! The access token is short-lived and replaced on refresh; the refresh
//! token outlives it and, once rejected by the server, invalidates the
//! whole session. Both are written on login and removed together on
//! logout or refresh failure.

use std::path::PathBuf;
use std::sync::RwLock;
use std::{fs, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A complete token pair, as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Read view of the store; either token may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredTokens {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

#[derive(Error, Debug)]
pub enum TokenStoreError {
    #[error("credential file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("credential file is malformed: {0}")]
    Format(#[from] serde_yaml::Error),

    #[error("could not determine home directory")]
    NoHomeDir,
}

/// Storage for the token pair, shared by the request pipeline and the
/// session. Reads treat unavailable storage as logged-out; writes report
/// their failures.
pub trait TokenStore: Send + Sync {
    /// Write both tokens. No validation of token shape.
    fn set(&self, pair: &TokenPair) -> Result<(), TokenStoreError>;

    /// Read whatever is stored.
    fn get(&self) -> StoredTokens;

    /// Replace only the access token, keeping the stored refresh token.
    fn replace_access(&self, access: &str) -> Result<(), TokenStoreError>;

    /// Remove both tokens. Idempotent; succeeds when nothing is stored.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// On-disk serialization: two fixed keys under the credentials file.
#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

/// Token store backed by `~/.wardrobe/credentials.yaml`.
///
/// Survives process restarts, so a logged-in CLI stays logged in the way
/// a browser tab does across reloads.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store at the default location under the user's home directory.
    pub fn new() -> Result<Self, TokenStoreError> {
        let home = dirs::home_dir().ok_or(TokenStoreError::NoHomeDir)?;
        Ok(Self {
            path: home.join(".wardrobe").join("credentials.yaml"),
        })
    }

    /// Store at an explicit path.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn read(&self) -> CredentialsFile {
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|err| {
                tracing::warn!(path = %self.path.display(), error = %err,
                    "credential file is malformed, treating as logged out");
                CredentialsFile::default()
            }),
            Err(_) => CredentialsFile::default(),
        }
    }

    fn write(&self, file: &CredentialsFile) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(file)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn set(&self, pair: &TokenPair) -> Result<(), TokenStoreError> {
        self.write(&CredentialsFile {
            access_token: Some(pair.access.clone()),
            refresh_token: Some(pair.refresh.clone()),
        })
    }

    fn get(&self) -> StoredTokens {
        let file = self.read();
        StoredTokens {
            access: file.access_token,
            refresh: file.refresh_token,
        }
    }

    fn replace_access(&self, access: &str) -> Result<(), TokenStoreError> {
        let mut file = self.read();
        file.access_token = Some(access.to_string());
        self.write(&file)
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory token store for tests and embedders that do not want
/// durable credentials.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<StoredTokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn set(&self, pair: &TokenPair) -> Result<(), TokenStoreError> {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.access = Some(pair.access.clone());
        tokens.refresh = Some(pair.refresh.clone());
        Ok(())
    }

    fn get(&self) -> StoredTokens {
        self.tokens
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn replace_access(&self, access: &str) -> Result<(), TokenStoreError> {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.access = Some(access.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        *tokens = StoredTokens::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> TokenPair {
        TokenPair {
            access: "access-1".to_string(),
            refresh: "refresh-1".to_string(),
        }
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get(), StoredTokens::default());

        store.set(&pair()).unwrap();
        let tokens = store.get();
        assert_eq!(tokens.access.as_deref(), Some("access-1"));
        assert_eq!(tokens.refresh.as_deref(), Some("refresh-1"));

        store.replace_access("access-2").unwrap();
        let tokens = store.get();
        assert_eq!(tokens.access.as_deref(), Some("access-2"));
        assert_eq!(tokens.refresh.as_deref(), Some("refresh-1"));

        store.clear().unwrap();
        assert_eq!(store.get(), StoredTokens::default());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::at(dir.path().join("nested").join("credentials.yaml"));

        // Nothing stored yet: reads as logged out, clear is a no-op.
        assert_eq!(store.get(), StoredTokens::default());
        store.clear().unwrap();

        store.set(&pair()).unwrap();
        assert_eq!(store.get().access.as_deref(), Some("access-1"));

        store.replace_access("access-2").unwrap();
        let tokens = store.get();
        assert_eq!(tokens.access.as_deref(), Some("access-2"));
        assert_eq!(tokens.refresh.as_deref(), Some("refresh-1"));

        store.clear().unwrap();
        assert_eq!(store.get(), StoredTokens::default());
        // Idempotent on an already-empty store.
        store.clear().unwrap();
    }

    #[test]
    fn test_malformed_file_reads_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.yaml");
        std::fs::write(&path, "{not yaml: [").unwrap();

        let store = FileTokenStore::at(path);
        assert_eq!(store.get(), StoredTokens::default());
    }
}
