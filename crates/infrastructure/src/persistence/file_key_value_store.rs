//! File-backed key/value store for the session.
//!
//! All keys live in one JSON document so the session survives restarts:
//!
//! ```json
//! {
//!   "items": {
//!     "accessToken": "eyJhbGciOi...",
//!     "refreshToken": "def50200...",
//!     "user": "{\"id\":42}"
//!   },
//!   "schema_version": 1
//! }
//! ```

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pulse_application::ports::{FileSystem, FileSystemError, KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use tokio::sync::Mutex;

const SCHEMA_VERSION: u32 = 1;

type Items = BTreeMap<String, String>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    items: Items,
    schema_version: u32,
}

/// Two-space indented, newline terminated. `Items` is a `BTreeMap`, so keys
/// come out sorted and the file diffs cleanly.
fn encode(document: &SessionFile) -> Result<Vec<u8>, StorageError> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"  "));
    document
        .serialize(&mut serializer)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    buffer.push(b'\n');
    Ok(buffer)
}

fn to_storage_error(error: FileSystemError) -> StorageError {
    match error {
        FileSystemError::Io(io_err) => StorageError::Io(io_err),
        other => StorageError::Backend(other.to_string()),
    }
}

/// Key/value store persisted as a single JSON file.
///
/// The file is read lazily on first access and cached. Every write goes to a
/// sibling temp file that is then renamed over the original, so a crash never
/// leaves a truncated document. Writers are serialised by an async lock.
#[derive(Debug)]
pub struct FileKeyValueStore<F> {
    fs: F,
    path: PathBuf,
    cache: Mutex<Option<Items>>,
}

impl<F: FileSystem> FileKeyValueStore<F> {
    /// Creates a store persisting to `path`. Nothing is read until first use.
    pub fn new(fs: F, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn load(&self) -> Result<Items, StorageError> {
        if !self.fs.exists(&self.path).await {
            return Ok(Items::new());
        }
        let content = self
            .fs
            .read_file(&self.path)
            .await
            .map_err(to_storage_error)?;

        match serde_json::from_slice::<SessionFile>(&content) {
            Ok(file) => Ok(file.items),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "session file is unreadable; starting empty"
                );
                Ok(Items::new())
            }
        }
    }

    async fn persist(&self, items: &Items) -> Result<(), StorageError> {
        let document = SessionFile {
            items: items.clone(),
            schema_version: SCHEMA_VERSION,
        };
        let content = encode(&document)?;

        let temp = self.temp_path();
        self.fs
            .write_file(&temp, &content)
            .await
            .map_err(to_storage_error)?;
        self.fs
            .rename(&temp, &self.path)
            .await
            .map_err(to_storage_error)
    }

    /// Applies `change` to a copy of the items and commits it once persisted.
    async fn update<C>(&self, change: C) -> Result<(), StorageError>
    where
        C: FnOnce(&mut Items) -> bool + Send,
    {
        let mut cache = self.cache.lock().await;
        let mut items = match cache.as_ref() {
            Some(items) => items.clone(),
            None => self.load().await?,
        };
        if change(&mut items) {
            self.persist(&items).await?;
        }
        *cache = Some(items);
        Ok(())
    }
}

#[async_trait]
impl<F: FileSystem> KeyValueStore for FileKeyValueStore<F> {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await?);
        }
        Ok(cache.as_ref().and_then(|items| items.get(key).cloned()))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string()).as_deref() != Some(value)
        })
        .await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.update(|items| items.remove(key).is_some()).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut cache = self.cache.lock().await;
        match self.fs.remove_file(&self.path).await {
            Ok(()) | Err(FileSystemError::NotFound(_)) => {}
            Err(e) => return Err(to_storage_error(e)),
        }
        *cache = Some(Items::new());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::persistence::TokioFileSystem;
    use pretty_assertions::assert_eq;

    fn store(dir: &tempfile::TempDir) -> FileKeyValueStore<TokioFileSystem> {
        FileKeyValueStore::new(TokioFileSystem::new(), dir.path().join("pulse/session.json"))
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        assert_eq!(store.get_item("accessToken").await.unwrap(), None);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_values_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let first = store(&dir);
            first.set_item("accessToken", "A1").await.unwrap();
            first.set_item("refreshToken", "R1").await.unwrap();
        }

        let second = store(&dir);

        assert_eq!(second.get_item("accessToken").await.unwrap().as_deref(), Some("A1"));
        assert_eq!(second.get_item("refreshToken").await.unwrap().as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn test_file_is_stable_json_without_temp_leftover() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.set_item("refreshToken", "R1").await.unwrap();
        store.set_item("accessToken", "A1").await.unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "items": {"accessToken": "A1", "refreshToken": "R1"},
                "schema_version": 1
            })
        );
        assert!(text.ends_with('\n'));
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.set_item("accessToken", "A1").await.unwrap();
        store.set_item("user", "{}").await.unwrap();

        store.remove_item("accessToken").await.unwrap();
        assert_eq!(store.get_item("accessToken").await.unwrap(), None);
        assert_eq!(store.get_item("user").await.unwrap().as_deref(), Some("{}"));

        store.clear().await.unwrap();
        assert_eq!(store.get_item("user").await.unwrap(), None);
        assert!(!store.path().exists());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_empty_and_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), b"{ not json").unwrap();

        assert_eq!(store.get_item("accessToken").await.unwrap(), None);

        store.set_item("accessToken", "A2").await.unwrap();
        let reopened = FileKeyValueStore::new(TokioFileSystem::new(), store.path().to_path_buf());
        assert_eq!(
            reopened.get_item("accessToken").await.unwrap().as_deref(),
            Some("A2")
        );
    }
}
