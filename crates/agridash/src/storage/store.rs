//! Async access to the record store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Storage, StorageStats};
use crate::error::{Error, Result};
use crate::observation::{NewObservation, Observation};

/// The persistence contract the HTTP layer depends on.
///
/// `insert` assigns `id` and `createdAt`; `list_all` returns records in
/// insertion order. Implementations must serialize concurrent inserts so
/// ids stay unique.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new observation.
    ///
    /// # Errors
    ///
    /// Returns a validation error for incomplete submissions, or a storage
    /// error if the write fails.
    async fn insert(&self, new: NewObservation) -> Result<Observation>;

    /// Read every stored observation.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be read.
    async fn list_all(&self) -> Result<Vec<Observation>>;
}

/// [`RecordStore`] backed by a shared `SQLite` [`Storage`].
///
/// The connection sits behind a mutex and every call runs on the blocking
/// thread pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    inner: Arc<Mutex<Storage>>,
}

impl SqliteStore {
    /// Wrap an opened storage engine.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self {
            inner: Arc::new(Mutex::new(storage)),
        }
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn stats(&self) -> Result<StorageStats> {
        self.with_storage(|storage| storage.stats()).await
    }

    async fn with_storage<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let storage = inner
                .lock()
                .map_err(|_| Error::StoreUnavailable("storage lock poisoned".to_string()))?;
            op(&*storage)
        })
        .await
        .map_err(|e| Error::StoreUnavailable(format!("storage task failed: {e}")))?
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn insert(&self, new: NewObservation) -> Result<Observation> {
        self.with_storage(move |storage| storage.insert(&new)).await
    }

    async fn list_all(&self) -> Result<Vec<Observation>> {
        self.with_storage(Storage::list_all).await
    }
}
