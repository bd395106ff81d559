use tokio::{
    fs::OpenOptions,
    io::{AsyncReadExt, AsyncSeekExt},
};
use utilities::result::Result;

/// Reads `chunk_size`-sized slices of a local file. Each read opens its own
/// descriptor so chunks can be pulled concurrently; the last slice may be
/// shorter.
pub struct FileChunker {
    file_path: String,
    chunk_size: u64,
}

impl FileChunker {
    pub fn new(file_path: String, chunk_size: u64) -> Self {
        Self {
            file_path,
            chunk_size,
        }
    }

    pub async fn read_chunk(&self, chunk_index: u64) -> Result<Vec<u8>> {
        let mut file = OpenOptions::new()
            .read(true)
            .open(&self.file_path)
            .await
            .map_err(|e| format!("Error while opening the file {} : {e:?}", self.file_path))?;
        let start_offset = chunk_index * self.chunk_size;
        file.seek(std::io::SeekFrom::Start(start_offset))
            .await
            .map_err(|e| {
                format!("Error while seeking to chunk {chunk_index} at offset {start_offset} : {e}")
            })?;
        let mut bytes = Vec::with_capacity(self.chunk_size as usize);
        file.take(self.chunk_size).read_to_end(&mut bytes).await?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn slices_are_chunk_sized_with_a_short_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.bin");
        let payload: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
        tokio::fs::write(&path, &payload).await.unwrap();

        let chunker = FileChunker::new(path.to_string_lossy().into_owned(), 1000);
        let chunk0 = chunker.read_chunk(0).await.unwrap();
        let chunk2 = chunker.read_chunk(2).await.unwrap();
        assert_eq!(chunk0.len(), 1000);
        assert_eq!(chunk2.len(), 500);
        assert_eq!(chunk0[..], payload[..1000]);
        assert_eq!(chunk2[..], payload[2000..]);
    }
}
