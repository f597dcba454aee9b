use async_trait::async_trait;

use super::Result;

/// Key/value store holding the derived copies of entities.
///
/// `set` and `delete` are the only commands the apply path issues; each is a
/// single-key operation and the backend's own atomicity per command is all
/// that is relied upon.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a value from the cache by key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Sets a value in the cache with no expiration, overwriting any
    /// previous value.
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Deletes a value from the cache by key. Deleting an absent key is not
    /// an error.
    async fn delete(&self, key: &str) -> Result<()>;
}
