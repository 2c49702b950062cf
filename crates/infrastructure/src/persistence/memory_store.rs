//! In-memory key/value store.

use std::collections::HashMap;

use async_trait::async_trait;
use pulse_application::ports::{KeyValueStore, StorageError};
use tokio::sync::RwLock;

/// Process-lifetime store for sessions that should not touch disk.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.items.write().await.clear();
        Ok(())
    }
}
