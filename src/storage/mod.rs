//! Persistence adapter
//!
//! Key-value storage for highlight and category snapshots. Backends:
//! nothing (session-only), process memory, local JSON files, and SQLite.

mod file;
mod memory;
mod sqlite;
mod types;
mod writer;

use std::sync::Arc;

use serde::de::DeserializeOwned;

pub use file::FileStore;
pub use memory::{MemoryStore, NoopStore};
pub use sqlite::SqliteStore;
pub use types::*;
pub use writer::Persister;

use crate::config::{StorageBackend, StorageConfig};

/// Open the backend selected in configuration
pub async fn open_backend(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    let backend: Arc<dyn KeyValueStore> = match config.backend {
        StorageBackend::None => Arc::new(NoopStore),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::File => Arc::new(FileStore::new(&config.path)),
        StorageBackend::Sqlite => Arc::new(SqliteStore::connect(&config.database_url).await?),
    };

    tracing::info!(backend = backend.name(), "Storage backend ready");
    Ok(backend)
}

/// Load and decode `key`, treating every failure as absent
pub async fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let value = match store.load(key).await {
        Ok(Some(value)) => value,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key = %key, backend = store.name(), error = %e, "Failed to load key");
            return None;
        }
    };

    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Ignoring malformed persisted value");
            None
        }
    }
}
