//! Local filesystem backend
//!
//! One pretty-printed JSON file per key under a base directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use super::types::{KeyValueStore, StorageError};

/// Filesystem key-value backend
#[derive(Debug, Clone)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_path` (created on first write)
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the file backing `key`
    ///
    /// Keys are percent-encoded, so distinct keys never share a file.
    fn key_path(&self, key: &str) -> PathBuf {
        let file_name = urlencoding::encode(key);
        self.base_path.join(format!("{}.json", file_name))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn save(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.base_path).await?;

        let path = self.key_path(key);
        let tmp_path = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(value)?;

        // Write then rename so a crash never leaves a truncated file
        tokio::fs::write(&tmp_path, &bytes).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        tracing::trace!(key = %key, path = %path.display(), bytes = bytes.len(), "Saved key");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        match tokio::fs::read(self.key_path(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.key_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
