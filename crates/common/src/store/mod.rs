mod memory;
mod provider;

pub use memory::{MemorySyncStore, MemorySyncStoreError};
pub use provider::{StoreError, SyncStore};
