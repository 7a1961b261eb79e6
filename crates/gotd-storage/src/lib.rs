//! Storage for the C64 game of the day
//!
//! A small namespaced key/value store standing in for per-browser storage.
//! Values are opaque strings; callers own their serialization format.
//!
//! # Backends
//!
//! - [`MemoryStore`]: process-local, used by tests and headless runs
//! - [`JsonFileStore`]: one JSON object file holding every key

mod file;
mod memory;
mod user;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use user::get_or_create_user_id;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Corrupt store file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable string key/value storage
pub trait KeyValueStore: Send + Sync {
    /// Read a key; `Ok(None)` when absent
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a key, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
