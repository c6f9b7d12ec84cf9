//! Snapshot-storage collaborator interface.
//!
//! Snapshots are whole opaque blobs addressed by a deterministic key;
//! a missing key is expected (first run for a query), never an error.

use async_trait::async_trait;

use crate::error::StoreResult;

/// Durable storage for persisted snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Fetch the blob stored under `key`, `None` when absent.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Store `bytes` under `key`, superseding any previous blob.
    async fn put(&self, key: &str, bytes: &[u8]) -> StoreResult<()>;
}
