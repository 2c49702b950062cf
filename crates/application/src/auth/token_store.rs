//! Persisted token storage.
//!
//! Wraps a [`KeyValueStore`] with the contract the request layer relies on:
//! reads never fail (a fault reads as "no token") and writes report their
//! outcome without ever aborting a request in flight. Every swallowed fault
//! is handed to an injectable [`StorageFaultHook`].

use std::fmt;
use std::sync::Arc;

use pulse_domain::{Credentials, TokenGrant, TokenKey};
use serde_json::Value;

use crate::ports::{KeyValueStore, StorageError};

/// Which store operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOperation {
    /// A read.
    Get,
    /// A write.
    Set,
    /// A single-key removal.
    Remove,
    /// A full clear.
    Clear,
}

/// A storage fault the token store absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageFault {
    /// Failed operation.
    pub operation: StorageOperation,
    /// Key involved, if the operation targets one.
    pub key: Option<TokenKey>,
    /// Rendered backend error.
    pub message: String,
}

/// Observer for absorbed storage faults.
pub type StorageFaultHook = Arc<dyn Fn(&StorageFault) + Send + Sync>;

/// Token store over an asynchronous key/value backend.
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
    on_fault: StorageFaultHook,
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

impl TokenStore {
    /// Creates a token store that logs absorbed faults.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            on_fault: Arc::new(log_fault),
        }
    }

    /// Replaces the fault observer.
    #[must_use]
    pub fn with_fault_hook(mut self, hook: StorageFaultHook) -> Self {
        self.on_fault = hook;
        self
    }

    /// Reads a value. Any backend fault reads as `None`.
    pub async fn get(&self, key: TokenKey) -> Option<String> {
        match self.backend.get_item(key.as_str()).await {
            Ok(value) => value,
            Err(e) => {
                self.report(StorageOperation::Get, Some(key), &e);
                None
            }
        }
    }

    /// Writes a value.
    ///
    /// # Errors
    ///
    /// Returns the backend error after reporting it; callers may ignore it.
    pub async fn set(&self, key: TokenKey, value: &str) -> Result<(), StorageError> {
        self.backend
            .set_item(key.as_str(), value)
            .await
            .inspect_err(|e| self.report(StorageOperation::Set, Some(key), e))
    }

    /// Removes a value.
    ///
    /// # Errors
    ///
    /// Returns the backend error after reporting it; callers may ignore it.
    pub async fn remove(&self, key: TokenKey) -> Result<(), StorageError> {
        self.backend
            .remove_item(key.as_str())
            .await
            .inspect_err(|e| self.report(StorageOperation::Remove, Some(key), e))
    }

    /// Removes every stored credential.
    ///
    /// # Errors
    ///
    /// Returns the backend error after reporting it; callers may ignore it.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.backend
            .clear()
            .await
            .inspect_err(|e| self.report(StorageOperation::Clear, None, e))
    }

    /// Reads the full credentials bundle.
    pub async fn credentials(&self) -> Credentials {
        Credentials {
            access_token: self.get(TokenKey::AccessToken).await,
            refresh_token: self.get(TokenKey::RefreshToken).await,
            user: self.user().await,
        }
    }

    /// Reads the cached user object. A corrupt value reads as `None`.
    pub async fn user(&self) -> Option<Value> {
        let raw = self.get(TokenKey::User).await?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "cached user is not valid JSON; ignoring");
                None
            }
        }
    }

    /// Caches the user object.
    ///
    /// # Errors
    ///
    /// Returns the backend error after reporting it; callers may ignore it.
    pub async fn set_user(&self, user: &Value) -> Result<(), StorageError> {
        self.set(TokenKey::User, &user.to_string()).await
    }

    /// Writes a new token pair, then the user object if the grant has one.
    ///
    /// The access token is written first. If the refresh token write then
    /// fails, the new access token is removed again so the store never pairs
    /// a new access token with a stale refresh token.
    ///
    /// # Errors
    ///
    /// Returns the first backend error; callers may ignore it.
    pub async fn store_grant(&self, grant: &TokenGrant) -> Result<(), StorageError> {
        self.set(TokenKey::AccessToken, &grant.access_token).await?;
        if let Err(e) = self.set(TokenKey::RefreshToken, &grant.refresh_token).await {
            let _ = self.remove(TokenKey::AccessToken).await;
            return Err(e);
        }
        if let Some(user) = &grant.data {
            self.set_user(user).await?;
        }
        Ok(())
    }

    fn report(&self, operation: StorageOperation, key: Option<TokenKey>, error: &StorageError) {
        (self.on_fault)(&StorageFault {
            operation,
            key,
            message: error.to_string(),
        });
    }
}

fn log_fault(fault: &StorageFault) {
    tracing::warn!(
        operation = ?fault.operation,
        key = ?fault.key,
        error = %fault.message,
        "token store fault absorbed"
    );
}
