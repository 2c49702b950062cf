//! Pulse Application - Request layer and ports
//!
//! This crate defines the application layer with:
//! - Port traits (HTTP transport, key/value persistence, file system)
//! - The token store, unauthorized channel, request executor and
//!   reauthentication coordinator
//! - Session control and the typed endpoint groups built on top
//! - Application-level configuration and error handling

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod executor;
pub mod ports;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{AuthApi, ProfileApi, TrackingApi};
pub use auth::{
    ReauthCoordinator, RefreshOutcome, StorageFault, StorageFaultHook, StorageOperation,
    Subscription, TokenStore, UnauthorizedChannel, UnauthorizedListener, UnauthorizedSignal,
};
pub use config::ClientConfig;
pub use error::{ApplicationError, ApplicationResult};
pub use executor::{Attempt, RequestExecutor};
pub use ports::{
    FileSystem, FileSystemError, HttpClient, HttpClientError, HttpRequest, HttpResponse,
    KeyValueStore, StorageError,
};
pub use session::{SessionController, SessionState};
