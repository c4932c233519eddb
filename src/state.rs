//! Application state management

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::html::RenderOptions;
use crate::session::ReviewSession;
use crate::storage::{KeyValueStore, NoopStore, Persister, StorageKeys};

/// A session shared between requests; the mutex makes it single-writer
pub type SharedSession = Arc<Mutex<ReviewSession>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    backend: Arc<dyn KeyValueStore>,
    persister: Persister,
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl AppState {
    /// Create a new application state
    ///
    /// Spawns the persistence writer, so this must run inside a Tokio runtime
    /// for writes to reach `backend`.
    pub fn new(config: Config, backend: Arc<dyn KeyValueStore>) -> Self {
        let persister = Persister::spawn(backend.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                persister,
                sessions: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// State with session-only storage
    pub fn ephemeral() -> Self {
        Self::new(Config::default(), Arc::new(NoopStore))
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the storage backend
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner.backend
    }

    pub fn persister(&self) -> &Persister {
        &self.inner.persister
    }

    /// Open a document, or replace the text of one already open
    ///
    /// Returns the session and whether it was newly opened.
    pub async fn open_document(&self, id: &str, text: String) -> (SharedSession, bool) {
        let existing = self.inner.sessions.read().await.get(id).cloned();
        if let Some(session) = existing {
            session.lock().await.replace_document(text);
            return (session, false);
        }

        let mut sessions = self.inner.sessions.write().await;
        // Another request may have opened it while we waited for the lock
        if let Some(session) = sessions.get(id).cloned() {
            session.lock().await.replace_document(text);
            return (session, false);
        }

        let session = ReviewSession::open(
            id,
            text,
            self.inner.backend.as_ref(),
            self.inner.persister.clone(),
            RenderOptions::from(&self.inner.config.render),
        )
        .await;
        let session = Arc::new(Mutex::new(session));
        sessions.insert(id.to_string(), session.clone());
        (session, true)
    }

    /// Look up an open document
    pub async fn session(&self, id: &str) -> Result<SharedSession> {
        self.inner
            .sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Document not open: {}", id)))
    }

    /// Close an open document and drop its session
    ///
    /// With `purge`, the stored highlights and categories are deleted too,
    /// after any writes still queued for them have landed.
    pub async fn close_document(&self, id: &str, purge: bool) -> Result<()> {
        let removed = self.inner.sessions.write().await.remove(id);
        if removed.is_none() {
            return Err(AppError::NotFound(format!("Document not open: {}", id)));
        }

        if purge {
            self.inner.persister.flush().await;
            let keys = StorageKeys::for_document(id);
            self.inner.backend.remove(&keys.highlights).await?;
            self.inner.backend.remove(&keys.categories).await?;
        }

        tracing::info!(document = %id, purge = purge, "Closed document");
        Ok(())
    }

    pub async fn session_count(&self) -> usize {
        self.inner.sessions.read().await.len()
    }

    /// Wait for queued writes to reach storage
    pub async fn shutdown(&self) {
        tracing::info!("Flushing pending highlight writes...");
        self.inner.persister.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError};
    use async_trait::async_trait;
    use serde_json::Value;

    /// Accepts writes but refuses deletes
    struct LockedStore;

    #[async_trait]
    impl KeyValueStore for LockedStore {
        async fn save(&self, _key: &str, _value: &Value) -> std::result::Result<(), StorageError> {
            Ok(())
        }

        async fn load(&self, _key: &str) -> std::result::Result<Option<Value>, StorageError> {
            Ok(None)
        }

        async fn remove(&self, _key: &str) -> std::result::Result<(), StorageError> {
            Err(StorageError::Unavailable("read-only volume".to_string()))
        }

        fn name(&self) -> &'static str {
            "locked"
        }
    }

    #[tokio::test]
    async fn test_open_and_replace() {
        let state = AppState::ephemeral();
        assert!(matches!(
            state.session("lease").await,
            Err(AppError::NotFound(_))
        ));

        let (_, created) = state.open_document("lease", "First draft.".into()).await;
        assert!(created);
        let (session, created) = state.open_document("lease", "Second draft.".into()).await;
        assert!(!created);

        assert_eq!(session.lock().await.document(), "Second draft.");
        assert_eq!(state.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_close_evicts_session() {
        let backend = Arc::new(MemoryStore::new());
        let state = AppState::new(Config::default(), backend.clone());

        state.open_document("lease", "Rent is due monthly.".into()).await;
        state.open_document("nda", "Keep it quiet.".into()).await;
        assert_eq!(state.session_count().await, 2);

        state.close_document("lease", false).await.unwrap();
        assert_eq!(state.session_count().await, 1);
        assert!(state.session("lease").await.is_err());
        assert!(matches!(
            state.close_document("lease", false).await,
            Err(AppError::NotFound(_))
        ));

        state.close_document("nda", true).await.unwrap();
        assert_eq!(state.session_count().await, 0);
        assert!(backend.load("highlight-categories:nda").await.unwrap().is_none());
        assert!(backend.load("highlight-categories:lease").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_purge_failure_is_storage_error() {
        let state = AppState::new(Config::default(), Arc::new(LockedStore));
        state.open_document("lease", "Rent is due monthly.".into()).await;

        let result = state.close_document("lease", true).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(state.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_writes() {
        let backend = Arc::new(MemoryStore::new());
        let state = AppState::new(Config::default(), backend.clone());

        state.open_document("lease", "Rent is due monthly.".into()).await;
        state.shutdown().await;

        assert!(backend
            .load("highlight-categories:lease")
            .await
            .unwrap()
            .is_some());
    }
}
