//! Filesystem snapshot store.
//!
//! One file per snapshot key inside a base directory. Keys are already
//! deterministic filenames, so the mapping is direct.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::traits::store::SnapshotStore;

/// Snapshot store backed by a local directory.
pub struct FsStore {
    base_dir: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `base_dir` (created on first write).
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are generated filenames; strip any path components a
        // hostile key could smuggle in.
        let file_name = Path::new(key)
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| key.replace(['/', '\\'], "_").into());
        self.base_dir.join(file_name)
    }
}

#[async_trait]
impl SnapshotStore for FsStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Backend(Box::new(e))),
        }
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))?;
        tokio::fs::write(self.path_for(key), bytes)
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))
    }
}
