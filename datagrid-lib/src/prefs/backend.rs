//! Preference backend trait.

use async_trait::async_trait;

use crate::error::StoreError;

/// Backend trait for preference storage.
///
/// Implementations handle raw byte storage and retrieval. The
/// [`PreferenceStore`](super::PreferenceStore) wraps this with JSON encoding,
/// sanitization and fail-soft error handling.
#[async_trait]
pub trait PreferenceBackend: Send + Sync {
    /// Get raw bytes for a key.
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Set raw bytes for a key.
    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Get all keys matching a prefix.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}
