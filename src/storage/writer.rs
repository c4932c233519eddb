//! Background persistence writer
//!
//! Mutations hand a snapshot to [`Persister::save`] and move on. A single
//! writer task drains the queue, keeps only the newest snapshot per key, and
//! writes it to the backend. Failures are logged and dropped.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use super::types::KeyValueStore;

enum WriteCommand {
    Save { key: String, value: Value },
    Remove { key: String },
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget handle to the writer task
#[derive(Clone)]
pub struct Persister {
    tx: Option<mpsc::UnboundedSender<WriteCommand>>,
}

impl Persister {
    /// Start a writer task for `backend`
    ///
    /// Outside a tokio runtime there is nothing to run the task on, so the
    /// returned handle is disabled.
    pub fn spawn(backend: Arc<dyn KeyValueStore>) -> Self {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(
                    backend = backend.name(),
                    "No async runtime available, persistence disabled"
                );
                return Self::disabled();
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        handle.spawn(run_writer(backend, rx));

        Self { tx: Some(tx) }
    }

    /// Handle that drops every write
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue a snapshot of `value` for `key`
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let Some(ref tx) = self.tx else {
            return;
        };

        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to serialize snapshot");
                return;
            }
        };

        let command = WriteCommand::Save {
            key: key.to_string(),
            value,
        };
        if tx.send(command).is_err() {
            tracing::warn!(key = %key, "Persistence writer stopped, snapshot dropped");
        }
    }

    /// Queue deletion of `key`; supersedes any snapshot queued before it
    pub fn remove(&self, key: &str) {
        let Some(ref tx) = self.tx else {
            return;
        };

        let command = WriteCommand::Remove {
            key: key.to_string(),
        };
        if tx.send(command).is_err() {
            tracing::warn!(key = %key, "Persistence writer stopped, removal dropped");
        }
    }

    /// Wait until every snapshot queued so far has been handled
    pub async fn flush(&self) {
        let Some(ref tx) = self.tx else {
            return;
        };

        let (done_tx, done_rx) = oneshot::channel();
        if tx.send(WriteCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

impl std::fmt::Debug for Persister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persister")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

async fn run_writer(backend: Arc<dyn KeyValueStore>, mut rx: mpsc::UnboundedReceiver<WriteCommand>) {
    tracing::debug!(backend = backend.name(), "Persistence writer started");

    while let Some(command) = rx.recv().await {
        // `None` marks a removal
        let mut pending: Vec<(String, Option<Value>)> = Vec::new();
        let mut waiters: Vec<oneshot::Sender<()>> = Vec::new();

        queue(command, &mut pending, &mut waiters);
        while let Ok(command) = rx.try_recv() {
            queue(command, &mut pending, &mut waiters);
        }

        for (key, value) in pending {
            let result = match value {
                Some(ref value) => backend.save(&key, value).await,
                None => backend.remove(&key).await,
            };
            match result {
                Ok(()) => tracing::debug!(
                    key = %key,
                    backend = backend.name(),
                    removed = value.is_none(),
                    "Persisted snapshot"
                ),
                Err(e) => tracing::warn!(
                    key = %key,
                    backend = backend.name(),
                    error = %e,
                    "Failed to persist snapshot"
                ),
            }
        }

        for waiter in waiters {
            let _ = waiter.send(());
        }
    }

    tracing::debug!(backend = backend.name(), "Persistence writer stopped");
}

/// Coalesce a command into the current batch
fn queue(
    command: WriteCommand,
    pending: &mut Vec<(String, Option<Value>)>,
    waiters: &mut Vec<oneshot::Sender<()>>,
) {
    match command {
        WriteCommand::Save { key, value } => coalesce(pending, key, Some(value)),
        WriteCommand::Remove { key } => coalesce(pending, key, None),
        WriteCommand::Flush(done) => waiters.push(done),
    }
}

fn coalesce(pending: &mut Vec<(String, Option<Value>)>, key: String, value: Option<Value>) {
    if let Some(slot) = pending.iter_mut().find(|(k, _)| *k == key) {
        slot.1 = value;
    } else {
        pending.push((key, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError};
    use async_trait::async_trait;
    use serde_json::json;

    struct FailingStore;

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn save(&self, _key: &str, _value: &Value) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        async fn load(&self, _key: &str) -> Result<Option<Value>, StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_last_snapshot_wins() {
        let backend = Arc::new(MemoryStore::new());
        let persister = Persister::spawn(backend.clone());

        for n in 0..10 {
            persister.save("counter", &json!(n));
        }
        persister.flush().await;

        assert_eq!(backend.load("counter").await.unwrap(), Some(json!(9)));
    }

    #[tokio::test]
    async fn test_remove_supersedes_and_is_superseded() {
        let backend = Arc::new(MemoryStore::new());
        let persister = Persister::spawn(backend.clone());

        persister.save("a", &json!([1]));
        persister.save("b", &json!([1]));
        persister.flush().await;

        persister.save("a", &json!([2]));
        persister.remove("a");
        persister.remove("b");
        persister.save("b", &json!([3]));
        persister.flush().await;

        assert_eq!(backend.load("a").await.unwrap(), None);
        assert_eq!(backend.load("b").await.unwrap(), Some(json!([3])));
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let persister = Persister::spawn(Arc::new(FailingStore));

        persister.save("k", &json!([1]));
        persister.flush().await;

        // Still accepting work after a failed write
        persister.save("k", &json!([2]));
        persister.flush().await;
        assert!(persister.is_enabled());
    }

    #[test]
    fn test_spawn_without_runtime_is_disabled() {
        let persister = Persister::spawn(Arc::new(MemoryStore::new()));
        assert!(!persister.is_enabled());
        persister.save("k", &json!(1));
    }

    #[tokio::test]
    async fn test_disabled_flush_returns() {
        let persister = Persister::disabled();
        persister.save("k", &json!(1));
        persister.flush().await;
    }
}
