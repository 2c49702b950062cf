//! Persistence adapters.

mod file_key_value_store;
mod file_system;
mod memory_store;

pub use file_key_value_store::FileKeyValueStore;
pub use file_system::TokioFileSystem;
pub use memory_store::MemoryKeyValueStore;
