//! Test doubles for the application ports.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs, dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pulse_domain::TokenKey;
use serde_json::Value;

use crate::auth::{TokenStore, UnauthorizedChannel};
use crate::config::ClientConfig;
use crate::executor::RequestExecutor;
use crate::ports::{
    HttpClient, HttpClientError, HttpRequest, HttpResponse, KeyValueStore, StorageError,
};

/// What the scripted server does with one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond {
        status: u16,
        body: Vec<u8>,
        delay: Duration,
    },
    Fail(HttpClientError),
}

impl Reply {
    pub fn json(status: u16, body: &Value) -> Self {
        Self::Respond {
            status,
            body: body.to_string().into_bytes(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self::Respond {
            status,
            body: body.as_bytes().to_vec(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(self, by: Duration) -> Self {
        match self {
            Self::Respond { status, body, .. } => Self::Respond {
                status,
                body,
                delay: by,
            },
            fail @ Self::Fail(_) => fail,
        }
    }
}

type Handler = Box<dyn Fn(&HttpRequest) -> Reply + Send + Sync>;

/// HTTP client whose responses come from a closure. Records every request.
pub struct ScriptedHttpClient {
    handler: Handler,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest) -> Reply + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Requests whose URL ends with `path`.
    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url.ends_with(path))
            .collect()
    }

    /// Bearer tokens sent to `path`, in order.
    pub fn bearers_to(&self, path: &str) -> Vec<Option<String>> {
        self.requests_to(path)
            .iter()
            .map(|request| bearer(request).map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpClientError> {
        let reply = (self.handler)(&request);
        self.requests.lock().push(request);
        match reply {
            Reply::Respond {
                status,
                body,
                delay,
            } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(HttpResponse::new(status, body))
            }
            Reply::Fail(error) => Err(error),
        }
    }
}

/// The bearer token of a request, if any.
pub fn bearer(request: &HttpRequest) -> Option<&str> {
    request
        .header("Authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// In-memory key/value store with switchable faults and a write log.
#[derive(Default)]
pub struct FlakyStore {
    items: Mutex<BTreeMap<String, String>>,
    writes: Mutex<Vec<String>>,
    failing_reads: Mutex<bool>,
    failing_writes: Mutex<bool>,
    failing_keys: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        let store = Self::new();
        store.seed(TokenKey::AccessToken, access);
        store.seed(TokenKey::RefreshToken, refresh);
        store
    }

    pub fn seed(&self, key: TokenKey, value: &str) {
        self.items
            .lock()
            .insert(key.as_str().to_string(), value.to_string());
    }

    pub fn value(&self, key: TokenKey) -> Option<String> {
        self.items.lock().get(key.as_str()).cloned()
    }

    pub fn fail_reads(&self, on: bool) {
        *self.failing_reads.lock() = on;
    }

    pub fn fail_writes(&self, on: bool) {
        *self.failing_writes.lock() = on;
    }

    pub fn fail_writes_for(&self, key: &str) {
        self.failing_keys.lock().insert(key.to_string());
    }

    /// Keys written successfully, in order.
    pub fn write_log(&self) -> Vec<String> {
        self.writes.lock().clone()
    }

    fn check_write(&self, key: &str) -> Result<(), StorageError> {
        if *self.failing_writes.lock() || self.failing_keys.lock().contains(key) {
            return Err(StorageError::Backend(format!("write to {key} refused")));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if *self.failing_reads.lock() {
            return Err(StorageError::Backend("read refused".to_string()));
        }
        Ok(self.items.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_write(key)?;
        self.items.lock().insert(key.to_string(), value.to_string());
        self.writes.lock().push(key.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check_write(key)?;
        self.items.lock().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        if *self.failing_writes.lock() {
            return Err(StorageError::Backend("clear refused".to_string()));
        }
        self.items.lock().clear();
        Ok(())
    }
}

/// A fully wired stack over scripted fakes.
pub struct Harness {
    pub http: Arc<ScriptedHttpClient>,
    pub backend: Arc<FlakyStore>,
    pub tokens: TokenStore,
    pub channel: UnauthorizedChannel,
    pub executor: RequestExecutor,
    pub config: ClientConfig,
}

impl Harness {
    pub fn new(http: Arc<ScriptedHttpClient>, backend: FlakyStore) -> Self {
        Self::with_config(http, Arc::new(backend), test_config())
    }

    pub fn with_config(
        http: Arc<ScriptedHttpClient>,
        backend: Arc<FlakyStore>,
        config: ClientConfig,
    ) -> Self {
        let tokens = TokenStore::new(backend.clone());
        let executor = RequestExecutor::new(http.clone(), tokens.clone(), &config);
        Self {
            http,
            backend,
            tokens,
            channel: UnauthorizedChannel::new(),
            executor,
            config,
        }
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig::with_base_url("https://api.test")
}
