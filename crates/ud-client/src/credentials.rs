//! Credential storage
//!
//! The bearer token and the signed-in admin survive between runs in a
//! [`CredentialStore`]. The token itself is kept behind [`SecretString`] so it
//! never ends up in `Debug` output or logs.

use async_trait::async_trait;
use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;
use ud_core::{UdError, UdResult};
use ud_models::{AuthUser, LoginResponse};

/// A bearer token and whom it belongs to
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: SecretString,
    pub user: AuthUser,
}

impl Credential {
    pub fn new(token: impl Into<String>, user: AuthUser) -> Self {
        Self {
            token: SecretString::new(token.into()),
            user,
        }
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

impl From<&LoginResponse> for Credential {
    fn from(response: &LoginResponse) -> Self {
        Self::new(response.access_token.clone(), response.user())
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> UdResult<Option<Credential>>;

    async fn save(&self, credential: &Credential) -> UdResult<()>;

    /// Forget the stored credential; a no-op when nothing is stored
    async fn clear(&self) -> UdResult<()>;
}

/// Credential held for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> UdResult<Option<Credential>> {
        Ok(self.credential.read().clone())
    }

    async fn save(&self, credential: &Credential) -> UdResult<()> {
        *self.credential.write() = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> UdResult<()> {
        *self.credential.write() = None;
        Ok(())
    }
}

/// On-disk layout of a stored credential
#[derive(Serialize, Deserialize)]
struct StoredCredential {
    token: String,
    username: String,
    is_superadmin: bool,
}

/// Credential kept in a JSON file
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

    fn io_error(&self, action: &str, e: std::io::Error) -> UdError {
        UdError::Config(format!(
            "failed to {} credentials at {}: {}",
            action,
            self.path.display(),
            e
        ))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> UdResult<Option<Credential>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error("read", e)),
        };

        match serde_json::from_str::<StoredCredential>(&raw) {
            Ok(stored) => Ok(Some(Credential::new(
                stored.token,
                AuthUser {
                    username: stored.username,
                    is_superadmin: stored.is_superadmin,
                },
            ))),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable credential file");
                Ok(None)
            }
        }
    }

    async fn save(&self, credential: &Credential) -> UdResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error("create directory for", e))?;
        }

        let stored = StoredCredential {
            token: credential.token.expose_secret().clone(),
            username: credential.user.username.clone(),
            is_superadmin: credential.user.is_superadmin,
        };
        let body = serde_json::to_string_pretty(&stored)
            .map_err(|e| UdError::Config(format!("failed to encode credentials: {}", e)))?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| self.io_error("write", e))
    }

    async fn clear(&self) -> UdResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error("remove", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> AuthUser {
        AuthUser {
            username: "root".into(),
            is_superadmin: true,
        }
    }

    #[test]
    fn test_debug_hides_token() {
        let credential = Credential::new("s3cret-token", admin());
        assert!(!format!("{:?}", credential).contains("s3cret-token"));
        assert_eq!(credential.bearer(), "Bearer s3cret-token");
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().await.unwrap().is_none());

        store.save(&Credential::new("abc", admin())).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.token.expose_secret(), "abc");
        assert_eq!(loaded.user, admin());

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("credentials.json"));

        assert!(store.load().await.unwrap().is_none());
        store.save(&Credential::new("abc", admin())).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.token.expose_secret(), "abc");
        assert_eq!(loaded.user.username, "root");

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_ignores_garbage() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "not json").unwrap();
        let store = FileCredentialStore::new(file.path());
        assert!(store.load().await.unwrap().is_none());
    }
}
