use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::buffer::WriteBuffer;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("flush failed: {0}")]
    Flush(String),
}

//
// ─── SCALARS ───────────────────────────────────────────────────────────────────
//

/// A single persisted value. Booleans are stored as `Int(0)` / `Int(1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarValue {
    Int(i64),
    Text(String),
}

impl ScalarValue {
    #[must_use]
    pub fn from_bool(value: bool) -> Self {
        Self::Int(i64::from(value))
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(v) => Some(*v),
            ScalarValue::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(v) => Some(v),
            ScalarValue::Int(_) => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ScalarValue::Int(_) => "int",
            ScalarValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int(v) => write!(f, "{v}"),
            ScalarValue::Text(v) => f.write_str(v),
        }
    }
}

//
// ─── PROGRESS STORE ────────────────────────────────────────────────────────────
//

/// Durable key/value store for scalar progress fields.
///
/// `set` and `delete` are staged and visible to `get` immediately; they become
/// durable only once `persist` returns. There is no multi-key transaction
/// guarantee across separate `persist` calls.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Read a key, including staged writes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<ScalarValue>, StorageError>;

    /// Stage a write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write cannot be staged.
    async fn set(&self, key: &str, value: ScalarValue) -> Result<(), StorageError>;

    /// Stage a deletion. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the deletion cannot be staged.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// All keys (committed or staged) starting with `prefix`, sorted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Make every staged write durable before returning.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Flush` if the writes could not be made durable;
    /// they stay staged for the next attempt.
    async fn persist(&self) -> Result<(), StorageError>;

    /// Integer value or `default` when missing or not an integer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_int_or(&self, key: &str, default: i64) -> Result<i64, StorageError> {
        Ok(match self.get(key).await? {
            Some(ScalarValue::Int(v)) => v,
            Some(other) => {
                tracing::warn!(key, kind = other.kind(), "expected int, using default");
                default
            }
            None => default,
        })
    }

    /// Boolean (`0`/`1` int) value or `default`. Any non-zero int is true.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_bool_or(&self, key: &str, default: bool) -> Result<bool, StorageError> {
        let raw = self.get_int_or(key, i64::from(default)).await?;
        Ok(raw != 0)
    }

    /// Text value or `default` when missing or not text.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_text_or(&self, key: &str, default: &str) -> Result<String, StorageError> {
        Ok(match self.get(key).await? {
            Some(ScalarValue::Text(v)) => v,
            Some(other) => {
                tracing::warn!(key, kind = other.kind(), "expected text, using default");
                default.to_owned()
            }
            None => default.to_owned(),
        })
    }
}

//
// ─── IN-MEMORY STORE ───────────────────────────────────────────────────────────
//

#[derive(Debug, Default)]
struct MemoryInner {
    committed: BTreeMap<String, ScalarValue>,
    staged: WriteBuffer,
    persist_calls: usize,
    fail_persist: bool,
}

/// In-memory store for tests and prototyping.
///
/// Keeps staged and committed values apart so tests can observe what a
/// restart would see (`reopen`).
#[derive(Clone, Default)]
pub struct InMemoryProgressStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl InMemoryProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>, StorageError> {
        self.inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    /// A fresh store holding only what has been persisted, as after a crash.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn reopen(&self) -> Result<Self, StorageError> {
        let committed = self.lock()?.committed.clone();
        Ok(Self {
            inner: Arc::new(Mutex::new(MemoryInner {
                committed,
                ..MemoryInner::default()
            })),
        })
    }

    /// Committed (durable) values only.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn durable_snapshot(&self) -> Result<BTreeMap<String, ScalarValue>, StorageError> {
        Ok(self.lock()?.committed.clone())
    }

    /// Number of `persist` calls that reached the store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn persist_calls(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.persist_calls)
    }

    /// Make subsequent `persist` calls fail, simulating a broken disk.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn set_fail_persist(&self, fail: bool) -> Result<(), StorageError> {
        self.lock()?.fail_persist = fail;
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn get(&self, key: &str) -> Result<Option<ScalarValue>, StorageError> {
        let guard = self.lock()?;
        if let Some(staged) = guard.staged.lookup(key) {
            return Ok(staged.cloned());
        }
        Ok(guard.committed.get(key).cloned())
    }

    async fn set(&self, key: &str, value: ScalarValue) -> Result<(), StorageError> {
        self.lock()?.staged.set(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.staged.delete(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let guard = self.lock()?;
        let committed = guard
            .committed
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        Ok(guard.staged.overlay_keys(prefix, committed))
    }

    async fn persist(&self) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.persist_calls += 1;
        if guard.fail_persist {
            return Err(StorageError::Flush("simulated persist failure".into()));
        }
        for (key, staged) in guard.staged.take() {
            match staged {
                crate::buffer::Staged::Set(value) => {
                    guard.committed.insert(key, value);
                }
                crate::buffer::Staged::Delete => {
                    guard.committed.remove(&key);
                }
            }
        }
        Ok(())
    }
}

//
// ─── STORAGE ───────────────────────────────────────────────────────────────────
//

/// Storage handles behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            progress: Arc::new(InMemoryProgressStore::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn staged_writes_are_visible_but_not_durable() {
        let store = InMemoryProgressStore::new();
        store.set("CurrentScore", ScalarValue::Int(30)).await.unwrap();
        assert_eq!(store.get_int_or("CurrentScore", 0).await.unwrap(), 30);

        let restarted = store.reopen().unwrap();
        assert_eq!(restarted.get_int_or("CurrentScore", 0).await.unwrap(), 0);

        store.persist().await.unwrap();
        let restarted = store.reopen().unwrap();
        assert_eq!(restarted.get_int_or("CurrentScore", 0).await.unwrap(), 30);
    }

    #[tokio::test]
    async fn missing_and_mistyped_keys_resolve_to_defaults() {
        let store = InMemoryProgressStore::new();
        store
            .set("Unit_1_Unlocked", ScalarValue::Text("yes".into()))
            .await
            .unwrap();
        assert!(!store.get_bool_or("Unit_1_Unlocked", false).await.unwrap());
        assert!(store.get_bool_or("Unit_9_Unlocked", true).await.unwrap());
        assert_eq!(store.get_text_or("PlayerName", "Player").await.unwrap(), "Player");
    }

    #[tokio::test]
    async fn failed_persist_keeps_writes_staged() {
        let store = InMemoryProgressStore::new();
        store.set_fail_persist(true).unwrap();
        store.set("CurrentScore", ScalarValue::Int(10)).await.unwrap();
        assert!(matches!(store.persist().await, Err(StorageError::Flush(_))));
        assert!(store.durable_snapshot().unwrap().is_empty());

        store.set_fail_persist(false).unwrap();
        store.persist().await.unwrap();
        assert_eq!(
            store.durable_snapshot().unwrap().get("CurrentScore"),
            Some(&ScalarValue::Int(10))
        );
        assert_eq!(store.persist_calls().unwrap(), 2);
    }

    #[tokio::test]
    async fn deletes_hide_committed_keys() {
        let store = InMemoryProgressStore::new();
        store.set("Unit_0_Completed", ScalarValue::Int(1)).await.unwrap();
        store.set("Unit_1_Completed", ScalarValue::Int(1)).await.unwrap();
        store.persist().await.unwrap();

        store.delete("Unit_0_Completed").await.unwrap();
        assert_eq!(store.get("Unit_0_Completed").await.unwrap(), None);
        assert_eq!(
            store.keys_with_prefix("Unit_").await.unwrap(),
            vec!["Unit_1_Completed".to_string()]
        );
    }
}
