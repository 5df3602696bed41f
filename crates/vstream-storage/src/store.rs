//! Object store abstraction.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Durable object storage that accepts local files.
///
/// Implementations must be safe to share between concurrent uploads. Retry
/// policy, if any, lives inside the implementation.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the file at `path` under `key`.
    async fn put_file(&self, key: &str, path: &Path, content_type: &str) -> StorageResult<()>;
}
