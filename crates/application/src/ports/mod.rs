//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the request layer and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod file_system;
mod http_client;
mod key_value_store;

pub use file_system::{FileSystem, FileSystemError};
pub use http_client::{HttpClient, HttpClientError, HttpRequest, HttpResponse};
pub use key_value_store::{KeyValueStore, StorageError};
