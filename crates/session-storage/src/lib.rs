//! Key-value storage for the Automator67 client.
//!
//! Two backends implement [`KeyValueStore`]:
//! - [`FileStorage`]: durable, one JSON object on disk, last writer wins
//! - [`MemoryStorage`]: process-lifetime, used for transient session-scoped
//!   values (the pending OAuth state) and in tests
//!
//! [`TokenStorage`] sits on top of a durable store and never surfaces
//! storage failures to its callers.

mod file;
mod json;
mod keys;
mod memory;
mod tokens;
mod traits;

pub use file::FileStorage;
pub use json::{load_json, save_json};
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use tokens::{TokenKind, TokenStorage};
pub use traits::KeyValueStore;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend refused or failed the operation
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Encoding(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
