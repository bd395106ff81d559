use std::cmp::min;

use utilities::logger::{instrument, tracing};

/// Byte range of one chunk within a file, plus its derived id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkBounds {
    pub chunk_id: String,
    pub chunk_index: u64,
    pub start_offset: u64,
    pub end_offset: u64,
}

/// Chunk ids are derived, not generated, so a re-upload of the same
/// filename reuses the same ids.
pub fn chunk_id(filename: &str, chunk_index: u64) -> String {
    format!("chunk_{filename}_{chunk_index}")
}

pub trait ChunkGenerator {
    fn get_chunks(&self, filename: &str, filesize: u64) -> Vec<ChunkBounds>;
}

pub struct DefaultChunkGenerator {
    chunk_size: u64,
}

impl DefaultChunkGenerator {
    pub fn new(chunk_size: u64) -> Self {
        Self { chunk_size }
    }
}

impl ChunkGenerator for DefaultChunkGenerator {
    #[instrument(name = "namenode_get_chunks", skip(self))]
    fn get_chunks(&self, filename: &str, filesize: u64) -> Vec<ChunkBounds> {
        let mut curr_offset: u64 = 0;
        let mut chunk_index: u64 = 0;
        let mut chunks: Vec<ChunkBounds> = vec![];
        while curr_offset < filesize {
            chunks.push(ChunkBounds {
                chunk_id: chunk_id(filename, chunk_index),
                chunk_index,
                start_offset: curr_offset,
                end_offset: min(curr_offset + self.chunk_size, filesize),
            });
            curr_offset += self.chunk_size;
            chunk_index += 1;
        }
        chunks
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn chunk_count_rounds_up_and_last_chunk_is_short() {
        let generator = DefaultChunkGenerator::new(1024 * 1024);
        let chunks = generator.get_chunks("video.bin", 2 * 1024 * 1024 + 512 * 1024);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].end_offset - chunks[0].start_offset, 1024 * 1024);
        assert_eq!(chunks[1].end_offset - chunks[1].start_offset, 1024 * 1024);
        assert_eq!(chunks[2].end_offset - chunks[2].start_offset, 512 * 1024);
        assert_eq!(chunks[2].chunk_id, "chunk_video.bin_2");
    }

    #[test]
    fn exact_multiple_has_no_trailing_chunk() {
        let generator = DefaultChunkGenerator::new(1024);
        let chunks = generator.get_chunks("a.bin", 2048);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].end_offset, 2048);
    }

    #[test]
    fn empty_file_has_no_chunks() {
        let generator = DefaultChunkGenerator::new(1024);
        assert!(generator.get_chunks("empty.bin", 0).is_empty());
    }
}
