use proto::messages::{Ack, ChunkData, ErrorKind, RemoteError, Reply, StoredChunk, decode_chunk, encode_chunk};
use storage::file_storage::FileStorage;
use storage::storage::Storage;
use utilities::logger::{error, info, instrument, tracing};

/// Serves the chunk lifecycle to clients: store, retrieve, delete.
pub struct ClientHandler {
    store: FileStorage,
}

impl ClientHandler {
    pub fn new(store: FileStorage) -> Self {
        Self { store }
    }

    /// Overwrite is allowed and idempotent. The digest is recorded next to
    /// the bytes and reported back; nothing verifies it on read in this
    /// datanode.
    #[instrument(name = "datanode_store_chunk", skip(self, data))]
    pub async fn store_chunk(&self, chunk_id: String, data: String) -> Reply<StoredChunk> {
        let bytes = match decode_chunk(&data) {
            Ok(bytes) => bytes,
            Err(e) => {
                return Reply::error(
                    ErrorKind::Internal,
                    format!("chunk payload is not valid base64: {e}"),
                );
            }
        };
        match self.store.write(&chunk_id, &bytes).await {
            Ok(checksum) => {
                info!(%chunk_id, size = bytes.len(), "Stored chunk");
                Reply::ok(StoredChunk {
                    chunk_id,
                    size: bytes.len() as u64,
                    checksum,
                })
            }
            Err(e) => {
                error!(%chunk_id, error=%e, "Error while storing chunk");
                Reply::error(ErrorKind::Internal, format!("failed to store chunk: {e}"))
            }
        }
    }

    /// Either the full chunk comes back or the call fails; there are no
    /// partial reads.
    #[instrument(name = "datanode_retrieve_chunk", skip(self))]
    pub async fn retrieve_chunk(&self, chunk_id: String) -> Reply<ChunkData> {
        match self.store.read(&chunk_id).await {
            Ok(Some(bytes)) => Reply::ok(ChunkData {
                data: encode_chunk(&bytes),
                chunk_id,
            }),
            Ok(None) => {
                Reply::Error(RemoteError::not_found(format!("Chunk not found: {chunk_id}")))
            }
            Err(e) => {
                error!(%chunk_id, error=%e, "Error while reading chunk");
                Reply::error(ErrorKind::Internal, format!("failed to read chunk: {e}"))
            }
        }
    }

    /// Deleting an absent chunk succeeds.
    #[instrument(name = "datanode_delete_chunk", skip(self))]
    pub async fn delete_chunk(&self, chunk_id: String) -> Reply<Ack> {
        match self.store.delete(&chunk_id).await {
            Ok(existed) => {
                if existed {
                    info!(%chunk_id, "Deleted chunk");
                }
                Reply::ok(Ack {})
            }
            Err(e) => {
                error!(%chunk_id, error=%e, "Error while deleting chunk");
                Reply::error(ErrorKind::Internal, format!("failed to delete chunk: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use storage::file_storage::FileStorageConfig;

    async fn handler() -> (tempfile::TempDir, ClientHandler) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::new(FileStorageConfig {
            root: dir.path().join("chunks"),
            capacity_bytes: 1024 * 1024,
        })
        .await
        .unwrap();
        (dir, ClientHandler::new(store))
    }

    #[tokio::test]
    async fn store_then_retrieve_round_trips() {
        let (_dir, handler) = handler().await;
        let payload = b"chunk bytes".to_vec();
        let stored = handler
            .store_chunk("chunk_a.bin_0".to_owned(), encode_chunk(&payload))
            .await
            .into_result()
            .unwrap();
        assert_eq!(stored.size, payload.len() as u64);
        assert!(!stored.checksum.is_empty());

        let fetched = handler
            .retrieve_chunk("chunk_a.bin_0".to_owned())
            .await
            .into_result()
            .unwrap();
        assert_eq!(decode_chunk(&fetched.data).unwrap(), payload);
    }

    #[tokio::test]
    async fn retrieving_a_missing_chunk_is_not_found() {
        let (_dir, handler) = handler().await;
        let err = handler
            .retrieve_chunk("chunk_missing_0".to_owned())
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn deleting_a_missing_chunk_succeeds() {
        let (_dir, handler) = handler().await;
        handler
            .delete_chunk("chunk_missing_0".to_owned())
            .await
            .into_result()
            .unwrap();
    }
}
