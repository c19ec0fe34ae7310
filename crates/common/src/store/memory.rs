use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::provider::{StoreError, SyncStore};

/// In-memory sync store, mostly for tests and the CLI
#[derive(Debug, Clone, Default)]
pub struct MemorySyncStore {
    inner: Arc<RwLock<BTreeMap<String, Value>>>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemorySyncStoreError {
    #[error("memory store error: {0}")]
    Internal(String),
}

impl MemorySyncStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_error<E: std::fmt::Display>(e: E) -> StoreError<MemorySyncStoreError> {
    StoreError::Provider(MemorySyncStoreError::Internal(format!(
        "failed to acquire lock: {}",
        e
    )))
}

#[async_trait]
impl SyncStore for MemorySyncStore {
    type Error = MemorySyncStoreError;

    async fn get(&self, id: &str) -> Result<Option<Value>, StoreError<Self::Error>> {
        let inner = self.inner.read().map_err(lock_error)?;
        Ok(inner.get(id).cloned())
    }

    async fn set(&self, id: &str, value: Value) -> Result<(), StoreError<Self::Error>> {
        let mut inner = self.inner.write().map_err(lock_error)?;
        inner.insert(id.to_string(), value);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError<Self::Error>> {
        let mut inner = self.inner.write().map_err(lock_error)?;
        Ok(inner.remove(id).is_some())
    }

    async fn values(&self) -> Result<Vec<Value>, StoreError<Self::Error>> {
        let inner = self.inner.read().map_err(lock_error)?;
        Ok(inner.values().cloned().collect())
    }
}
