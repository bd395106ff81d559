use std::path::PathBuf;
use tracing::{error, info, instrument};

use crate::storage::{Result, Storage, StorageUsage};
use tokio::fs;

const STAGED_DIR: &str = "staged";
const DIGEST_SUFFIX: &str = ".digest";

/// Chunk container rooted at a directory with a configured byte capacity.
/// Bytes land in a staging area first and are renamed into place, so a
/// chunk is either fully present or absent.
#[derive(Clone)]
pub struct FileStorage {
    root: PathBuf,
    capacity: u64,
}

pub struct FileStorageConfig {
    pub root: PathBuf,
    pub capacity_bytes: u64,
}

fn validate_chunk_id(chunk_id: &str) -> Result<()> {
    if chunk_id.is_empty()
        || chunk_id.contains('/')
        || chunk_id.contains('\\')
        || chunk_id.contains("..")
    {
        return Err(format!("invalid chunk id {chunk_id:?}").into());
    }
    Ok(())
}

impl FileStorage {
    pub async fn new(config: FileStorageConfig) -> Result<Self> {
        let root = config.root;
        fs::create_dir_all(root.join(STAGED_DIR)).await.map_err(|e| {
            error!(root=%root.display(), error=%e, "Error while creating the storage root");
            format!("Error while creating storage root {}: {e}", root.display())
        })?;
        info!(root=%root.display(), capacity=%config.capacity_bytes, "Chunk storage ready");
        Ok(FileStorage {
            root,
            capacity: config.capacity_bytes,
        })
    }
    fn chunk_path(&self, chunk_id: &str) -> PathBuf {
        self.root.join(chunk_id)
    }
    fn staged_path(&self, chunk_id: &str) -> PathBuf {
        self.root.join(STAGED_DIR).join(chunk_id)
    }
    fn digest_path(&self, chunk_id: &str) -> PathBuf {
        self.root.join(format!("{chunk_id}{DIGEST_SUFFIX}"))
    }
}

impl Storage for FileStorage {
    #[instrument(name = "file_storage_write", skip(self, bytes))]
    async fn write(&self, chunk_id: &str, bytes: &[u8]) -> Result<String> {
        validate_chunk_id(chunk_id)?;
        let digest = blake3::hash(bytes).to_hex().to_string();
        let staged = self.staged_path(chunk_id);
        fs::write(&staged, bytes).await?;
        fs::rename(&staged, self.chunk_path(chunk_id)).await?;
        fs::write(self.digest_path(chunk_id), &digest).await?;
        info!(%chunk_id, size = bytes.len(), "chunk stored");
        Ok(digest)
    }

    #[instrument(name = "file_storage_read", skip(self))]
    async fn read(&self, chunk_id: &str) -> Result<Option<Vec<u8>>> {
        validate_chunk_id(chunk_id)?;
        match fs::read(self.chunk_path(chunk_id)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, chunk_id: &str) -> Result<bool> {
        validate_chunk_id(chunk_id)?;
        let existed = match fs::remove_file(self.chunk_path(chunk_id)).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = fs::remove_file(self.digest_path(chunk_id)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                error!(%chunk_id, error=%e, "failed to remove digest sidecar");
            }
        }
        Ok(existed)
    }

    #[instrument(name = "file_storage_available_chunks", skip(self))]
    async fn available_chunks(&self) -> Result<Vec<String>> {
        let mut dir_entries = fs::read_dir(&self.root).await?;
        let mut chunk_ids = vec![];
        while let Some(entry) = dir_entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry
                .file_name()
                .into_string()
                .map_err(|_| "Invalid file name in storage root")?;
            if name.ends_with(DIGEST_SUFFIX) {
                continue;
            }
            chunk_ids.push(name);
        }
        Ok(chunk_ids)
    }

    async fn usage(&self) -> Result<StorageUsage> {
        let mut used = 0u64;
        let mut dir_entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = dir_entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if metadata.is_file() {
                used += metadata.len();
            }
        }
        Ok(StorageUsage {
            available: self.capacity.saturating_sub(used),
            total: self.capacity,
        })
    }
}

impl FileStorage {
    /// Reads the digest previously recorded for a chunk, if any.
    pub async fn recorded_digest(&self, chunk_id: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.digest_path(chunk_id)).await {
            Ok(digest) => Ok(Some(digest)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::storage_test;

    #[tokio::test]
    async fn file_storage_test() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let storage = FileStorage::new(FileStorageConfig {
            root: dir.path().join("chunks"),
            capacity_bytes: 4 * 1024 * 1024,
        })
        .await?;
        storage_test(storage).await
    }

    #[tokio::test]
    async fn chunk_ids_cannot_escape_the_root() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let storage = FileStorage::new(FileStorageConfig {
            root: dir.path().to_path_buf(),
            capacity_bytes: 1024,
        })
        .await?;
        assert!(storage.write("../outside", b"x").await.is_err());
        assert!(storage.read("a/b").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn digest_is_recorded_next_to_the_chunk() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let storage = FileStorage::new(FileStorageConfig {
            root: dir.path().to_path_buf(),
            capacity_bytes: 1024,
        })
        .await?;
        let digest = storage.write("chunk_a_0", b"payload").await?;
        assert_eq!(storage.recorded_digest("chunk_a_0").await?, Some(digest));
        assert_eq!(storage.recorded_digest("chunk_missing_0").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn usage_counts_against_configured_capacity() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let storage = FileStorage::new(FileStorageConfig {
            root: dir.path().to_path_buf(),
            capacity_bytes: 1000,
        })
        .await?;
        let before = storage.usage().await?;
        assert_eq!(before.total, 1000);
        assert_eq!(before.available, 1000);
        storage.write("chunk_a_0", &[7u8; 100]).await?;
        let after = storage.usage().await?;
        // chunk bytes plus the digest sidecar count as used space
        assert!(after.available < 900 + 1);
        assert_eq!(after.total, 1000);
        Ok(())
    }
}
