use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use utilities::{
    logger::{instrument, trace, tracing},
    result::Result,
};

/// Reassembles downloaded chunks into the target file. The file is
/// pre-sized up front so chunks can land at their offsets in any order.
#[derive(Clone)]
pub struct ChunkJoiner {
    file_path: String,
}

impl ChunkJoiner {
    #[instrument(name = "new_chunk_joiner")]
    pub async fn new(file_path: String, file_size: u64) -> Result<Self> {
        trace!("Creating the target file");
        let mut file = tokio::fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&file_path)
            .await
            .map_err(|e| format!("Error while creating the target file {file_path} : {e}"))?;
        if file_size > 0 {
            // reserving space for the file we are going to reassemble
            file.seek(std::io::SeekFrom::Start(file_size - 1))
                .await
                .map_err(|e| format!("Error while reserving space {e}"))?;
            file.write_all(&[0])
                .await
                .map_err(|e| format!("Error while writing to the file initially {e:?}"))?;
        }
        Ok(Self { file_path })
    }

    #[instrument(skip(self, bytes))]
    pub async fn join_chunk(&self, chunk_index: u64, chunk_size: u64, bytes: &[u8]) -> Result<()> {
        // a fresh descriptor per chunk keeps concurrent writers independent
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .open(&self.file_path)
            .await
            .map_err(|e| format!("Error while opening the target file {e:?}"))?;
        file.seek(std::io::SeekFrom::Start(chunk_index * chunk_size))
            .await
            .map_err(|e| format!("Error while seeking to the chunk offset {e:?}"))?;
        file.write_all(bytes)
            .await
            .map_err(|e| format!("Error while writing the chunk {e:?}"))?;
        Ok(())
    }

    /// Advisory cleanup after a failed download: the partial file goes away.
    #[instrument(name = "abort_chunk_join", skip(self))]
    pub async fn abort(&self) {
        let _ = tokio::fs::remove_file(&self.file_path).await;
    }
}
