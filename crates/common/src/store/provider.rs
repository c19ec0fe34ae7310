use std::fmt::{Debug, Display};

use async_trait::async_trait;
use serde_json::Value;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError<T> {
    /// Anything the backing store itself reports
    #[error("unhandled sync store error: {0}")]
    Provider(#[from] T),
}

/// The replicated key -> JSON map that encrypted entities are written into
///
/// Merge and replication are the store's business. Everything written through
///  [`FieldCipher::put_entity`](crate::content::FieldCipher::put_entity) has
///  its sensitive fields encrypted already.
#[async_trait]
pub trait SyncStore: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug + Send + Sync;

    /// Fetch the value stored under `id`, if any
    async fn get(&self, id: &str) -> Result<Option<Value>, StoreError<Self::Error>>;

    /// Insert or replace the value stored under `id`
    async fn set(&self, id: &str, value: Value) -> Result<(), StoreError<Self::Error>>;

    /// Remove `id`
    ///
    /// # Returns
    /// * `Ok(true)` - an entry was removed
    /// * `Ok(false)` - there was nothing under `id`
    async fn delete(&self, id: &str) -> Result<bool, StoreError<Self::Error>>;

    /// Every stored value, in key order
    async fn values(&self) -> Result<Vec<Value>, StoreError<Self::Error>>;
}
