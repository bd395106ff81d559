use std::error::Error;

pub type Result<T> = std::result::Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageUsage {
    pub available: u64,
    pub total: u64,
}

/// A flat chunk container keyed by chunk id. Writes are whole-chunk and
/// record a content digest next to the bytes; reads return the full chunk
/// or nothing.
pub trait Storage {
    /// Stores the bytes under `chunk_id`, replacing any previous version,
    /// and returns the hex digest that was recorded alongside.
    async fn write(&self, chunk_id: &str, bytes: &[u8]) -> Result<String>;
    /// Returns the stored bytes, or `None` when the chunk is absent.
    async fn read(&self, chunk_id: &str) -> Result<Option<Vec<u8>>>;
    /// Removes the chunk. Deleting an absent chunk succeeds; the flag
    /// reports whether anything was actually removed.
    async fn delete(&self, chunk_id: &str) -> Result<bool>;
    async fn available_chunks(&self) -> Result<Vec<String>>;
    async fn usage(&self) -> Result<StorageUsage>;
}
