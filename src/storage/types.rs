//! Storage types

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Key prefix for the highlight collection
pub const HIGHLIGHTS_KEY: &str = "contract-highlights";

/// Key prefix for the category registry
pub const CATEGORIES_KEY: &str = "highlight-categories";

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable key-value surface for highlights and categories
///
/// Callers treat every backend as best effort; a backend that drops all
/// writes is a valid implementation.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store a JSON value under `key`, replacing any previous value
    async fn save(&self, key: &str, value: &Value) -> Result<(), StorageError>;

    /// Load the value stored under `key`
    async fn load(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Delete the value stored under `key`
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// The two keys used by one review session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub highlights: String,
    pub categories: String,
}

impl StorageKeys {
    /// Keys scoped to a single document
    pub fn for_document(document_id: &str) -> Self {
        Self {
            highlights: format!("{}:{}", HIGHLIGHTS_KEY, document_id),
            categories: format!("{}:{}", CATEGORIES_KEY, document_id),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            highlights: HIGHLIGHTS_KEY.to_string(),
            categories: CATEGORIES_KEY.to_string(),
        }
    }
}
