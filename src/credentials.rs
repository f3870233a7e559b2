//! API key storage.
//!
//! The key is the only piece of state that survives the process. It is
//! re-read before every outbound request so an edit to the key file (or
//! a `--set-key` from another shell) is picked up without a restart.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Result;

/// Injected capability for reading and writing the provider API key.
///
/// `get` returning `Ok(None)` is the first-class "no key yet" case;
/// callers short-circuit to a missing-credential outcome before any
/// network attempt.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Result<Option<String>>;
    fn set(&self, key: &str) -> Result<()>;
}

/// OpenAI API keys start with `sk-`. Used to reject typos on save, not
/// as a security check.
pub fn looks_like_api_key(key: &str) -> bool {
    key.trim().starts_with("sk-")
}

/// On-disk shape of the key file.
#[derive(Debug, Serialize, Deserialize)]
struct KeyDotJson {
    #[serde(rename = "OPENAI_API_KEY")]
    openai_api_key: Option<String>,
}

/// File-backed store at `{app_home}/key.json`.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store under the given app home directory.
    pub fn new(app_home: &Path) -> Self {
        Self {
            path: app_home.join("key.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<KeyDotJson>(&content) {
            Ok(parsed) => Ok(parsed
                .openai_api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())),
            Err(e) => {
                warn!("failed to parse {}: {e}", self.path.display());
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&KeyDotJson {
            openai_api_key: Some(key.trim().to_string()),
        })?;
        fs::write(&self.path, content)?;
        debug!("saved API key to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store, for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryCredentialStore {
    key: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: &str) -> Self {
        Self {
            key: Mutex::new(Some(key.to_string())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<String>> {
        Ok(self.key.lock().map_err(|_| poisoned())?.clone())
    }

    fn set(&self, key: &str) -> Result<()> {
        *self.key.lock().map_err(|_| poisoned())? = Some(key.trim().to_string());
        Ok(())
    }
}

fn poisoned() -> crate::RafiqError {
    crate::RafiqError::Credential("credential store lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_format_check() {
        assert!(looks_like_api_key("sk-abc123"));
        assert!(looks_like_api_key("  sk-abc123  "));
        assert!(!looks_like_api_key("abc123"));
        assert!(!looks_like_api_key(""));
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = FileCredentialStore::new(temp.path());

        assert_eq!(store.get().unwrap(), None);

        store.set("  sk-test-key  ").unwrap();
        assert_eq!(store.get().unwrap(), Some("sk-test-key".to_string()));

        // A second store over the same home sees the same key.
        let store2 = FileCredentialStore::new(temp.path());
        assert_eq!(store2.get().unwrap(), Some("sk-test-key".to_string()));
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("nested").join("home");
        let store = FileCredentialStore::new(&home);
        store.set("sk-x").unwrap();
        assert!(home.join("key.json").exists());
    }

    #[test]
    fn test_file_store_tolerates_garbage() {
        let temp = TempDir::new().unwrap();
        let store = FileCredentialStore::new(temp.path());
        fs::write(store.path(), "not json").unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_file_store_empty_key_is_absent() {
        let temp = TempDir::new().unwrap();
        let store = FileCredentialStore::new(temp.path());
        fs::write(store.path(), r#"{"OPENAI_API_KEY": "   "}"#).unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get().unwrap(), None);
        store.set("sk-mem").unwrap();
        assert_eq!(store.get().unwrap(), Some("sk-mem".to_string()));

        let seeded = MemoryCredentialStore::with_key("sk-seeded");
        assert_eq!(seeded.get().unwrap(), Some("sk-seeded".to_string()));
    }
}
