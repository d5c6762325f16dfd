use async_trait::async_trait;

use super::error::StorageError;

/// Key-addressed file storage for uploaded avatars and event media.
///
/// Every `put` is a whole-file replace: readers observe either the previous
/// content or the new content, never a partial write.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store bytes under `key`, replacing any previous content.
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete the file stored under `key`.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;
}
