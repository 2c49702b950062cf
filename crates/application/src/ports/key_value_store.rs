//! Key/value persistence port
//!
//! The raw, fallible boundary the token store sits on. Unlike the token
//! store, implementations report every fault.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during key/value operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Asynchronous string key/value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value. Missing keys are `Ok(None)`.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value, replacing any previous one.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes a value. Removing a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Removes every value.
    async fn clear(&self) -> Result<(), StorageError>;
}
