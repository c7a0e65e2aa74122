//! Key-value persistence for the current draft and the provider credential.
//!
//! Storage is injected: the pipelines never touch it, and callers choose an
//! in-process [`MemoryStore`] or a [`JsonFileStore`] backed by one JSON
//! object file. Writes replace the previous value; there is no history.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::{BlogflowError, Result};

/// Key under which the draft HTML is stored.
pub const DRAFT_KEY: &str = "current-draft";
/// Key under which the provider credential is stored.
pub const CREDENTIAL_KEY: &str = "blogflow_gemini_key";

/// String-keyed, string-valued storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process store; contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A store persisted as a single JSON object on disk.
///
/// The file is created on first write, along with any missing parent
/// directories. A missing file reads as empty. Each write goes to a sibling
/// `.tmp` file that is then renamed over the target, so the file on disk is
/// always either the old or the new contents.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "store.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&raw).map_err(|e| {
            BlogflowError::Storage(format!("{}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.read_all().await?;
        Ok(match entries.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _lock = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let body = serde_json::to_string_pretty(&entries)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, body).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        debug!(key, path = %self.path.display(), "stored value");
        Ok(())
    }
}

/// The single current draft.
#[derive(Clone)]
pub struct DraftStore {
    store: Arc<dyn KeyValueStore>,
}

impl DraftStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The saved draft, or an empty string if none was saved.
    pub async fn load(&self) -> Result<String> {
        Ok(self.store.get(DRAFT_KEY).await?.unwrap_or_default())
    }

    pub async fn save(&self, html: &str) -> Result<()> {
        self.store.set(DRAFT_KEY, html).await
    }
}

/// The saved provider credential.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The credential, or `None` if absent or blank.
    pub async fn load(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(CREDENTIAL_KEY)
            .await?
            .filter(|key| !key.trim().is_empty()))
    }

    pub async fn save(&self, key: &str) -> Result<()> {
        self.store.set(CREDENTIAL_KEY, key.trim()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_last_write_wins() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "one").await.unwrap();
        store.set("k", "two").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_draft_absent_reads_empty() {
        let drafts = DraftStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(drafts.load().await.unwrap(), "");
        drafts.save("<h1>Draft</h1>").await.unwrap();
        assert_eq!(drafts.load().await.unwrap(), "<h1>Draft</h1>");
    }

    #[tokio::test]
    async fn test_credential_blank_is_absent() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let creds = CredentialStore::new(store.clone());
        assert_eq!(creds.load().await.unwrap(), None);

        creds.save("   ").await.unwrap();
        assert_eq!(creds.load().await.unwrap(), None);

        creds.save(" AIza-key ").await.unwrap();
        assert_eq!(creds.load().await.unwrap().as_deref(), Some("AIza-key"));
        assert_eq!(
            store.get(CREDENTIAL_KEY).await.unwrap().as_deref(),
            Some("AIza-key")
        );
    }

    #[tokio::test]
    async fn test_json_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = JsonFileStore::new(&path);
        assert_eq!(store.get(DRAFT_KEY).await.unwrap(), None);
        store.set(DRAFT_KEY, "<p>saved</p>").await.unwrap();
        store.set(CREDENTIAL_KEY, "key").await.unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(
            reopened.get(DRAFT_KEY).await.unwrap().as_deref(),
            Some("<p>saved</p>")
        );
        assert_eq!(reopened.get(CREDENTIAL_KEY).await.unwrap().as_deref(), Some("key"));

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["current-draft"], "<p>saved</p>");
    }

    #[tokio::test]
    async fn test_json_file_store_replaces_file_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = JsonFileStore::new(&path);
        store.set(DRAFT_KEY, "<p>first</p>").await.unwrap();

        // Leftover from a write that never reached its rename.
        let temp = dir.path().join("store.json.tmp");
        assert_eq!(store.temp_path(), temp);
        std::fs::write(&temp, "{\"current-dr").unwrap();
        assert_eq!(
            store.get(DRAFT_KEY).await.unwrap().as_deref(),
            Some("<p>first</p>")
        );

        store.set(DRAFT_KEY, "<p>second</p>").await.unwrap();
        assert!(!temp.exists());
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);
        assert_eq!(
            JsonFileStore::new(&path)
                .get(DRAFT_KEY)
                .await
                .unwrap()
                .as_deref(),
            Some("<p>second</p>")
        );
    }

    #[tokio::test]
    async fn test_json_file_store_corrupt_file_is_storage_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{not json").unwrap();

        let store = JsonFileStore::new(file.path());
        assert!(matches!(
            store.get(DRAFT_KEY).await,
            Err(BlogflowError::Storage(_))
        ));
    }
}
