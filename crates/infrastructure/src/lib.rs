//! Pulse Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus process-level setup
//! (configuration loading and tracing).

pub mod adapters;
pub mod config;
pub mod logging;
pub mod persistence;

pub use adapters::ReqwestHttpClient;
pub use config::{ConfigError, load_config, load_config_from, session_path};
pub use logging::init_tracing;
pub use persistence::{FileKeyValueStore, MemoryKeyValueStore, TokioFileSystem};
