//! Persistent token storage

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::token::{TokenError, TokenPair};

/// Persisted store for the token pair
///
/// The app plugs its platform secure storage in here. Implementations must be
/// cheap to call from the auth coordinator: `save` and `clear` run on the
/// refresh path.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the stored pair, `None` if nothing was saved
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read
    async fn load(&self) -> Result<Option<TokenPair>, TokenError>;

    /// Persist the pair, replacing what was stored
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written
    async fn save(&self, tokens: &TokenPair) -> Result<(), TokenError>;

    /// Remove any stored pair
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written
    async fn clear(&self) -> Result<(), TokenError>;
}

#[async_trait]
impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    async fn load(&self) -> Result<Option<TokenPair>, TokenError> {
        (**self).load().await
    }

    async fn save(&self, tokens: &TokenPair) -> Result<(), TokenError> {
        (**self).save(tokens).await
    }

    async fn clear(&self) -> Result<(), TokenError> {
        (**self).clear().await
    }
}

/// Type alias for a shared token store.
pub type SharedTokenStore = Arc<dyn TokenStore>;

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store, for tests and for sessions that must not persist
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<TokenPair>>,
}

impl MemoryTokenStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a pair
    #[must_use]
    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }

    /// Current contents without going through the async interface
    #[must_use]
    pub fn snapshot(&self) -> Option<TokenPair> {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<TokenPair>, TokenError> {
        Ok(self.snapshot())
    }

    async fn save(&self, tokens: &TokenPair) -> Result<(), TokenError> {
        *self.tokens.lock().unwrap_or_else(PoisonError::into_inner) = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenError> {
        *self.tokens.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// ============================================================================
// File store
// ============================================================================

/// JSON file store with user-only permissions
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    storage_path: PathBuf,
}

impl Default for FileTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileTokenStore {
    /// Create a store at the default path (platform-specific config directory)
    #[must_use]
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nailkit");

        Self {
            storage_path: config_dir.join("tokens.json"),
        }
    }

    /// Create a store with a custom path
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { storage_path: path }
    }

    /// Get the storage path
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.storage_path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<TokenPair>, TokenError> {
        let content = match tokio::fs::read_to_string(&self.storage_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let tokens: TokenPair = serde_json::from_str(&content)?;
        Ok(Some(tokens))
    }

    async fn save(&self, tokens: &TokenPair) -> Result<(), TokenError> {
        if let Some(parent) = self.storage_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(tokens)?;
        tokio::fs::write(&self.storage_path, &content).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&self.storage_path, perms).await?;
        }

        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenError> {
        match tokio::fs::remove_file(&self.storage_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        assert!(store.load().await.unwrap().is_none());

        store.save(&TokenPair::new("a", "r")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(TokenPair::new("a", "r")));

        store.clear().await.unwrap();
        assert!(store.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_file_store_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::with_path(temp_dir.path().join("nested").join("tokens.json"));

        store.save(&TokenPair::new("test_access", "test_refresh")).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();

        assert_eq!(loaded.access_token.as_deref(), Some("test_access"));
        assert_eq!(loaded.refresh_token.as_deref(), Some("test_refresh"));
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::with_path(temp_dir.path().join("nonexistent.json"));

        assert!(store.load().await.unwrap().is_none());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_clear_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tokens.json");
        let store = FileTokenStore::with_path(path.clone());

        store.save(&TokenPair::new("a", "r")).await.unwrap();
        assert!(path.exists());
        store.clear().await.unwrap();
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_is_user_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tokens.json");
        let store = FileTokenStore::with_path(path.clone());
        store.save(&TokenPair::new("a", "r")).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
