use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use proto::messages::ChunkCommit;

/// The replicas recorded for one chunk. The set only shrinks after
/// creation: dead datanodes are stripped, nothing is ever re-replicated.
#[derive(Debug, Clone)]
pub struct ChunkPlacement {
    pub chunk_id: String,
    pub chunk_index: u64,
    pub replicas: Vec<String>,
}

/// One file in the namespace. Created whole at upload_complete, replaced
/// wholesale on re-upload (last writer wins), removed on delete.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub filename: String,
    pub filesize: u64,
    pub chunk_size: u64,
    pub replication_factor: u32,
    pub created_at: u64,
    pub chunks: Vec<ChunkPlacement>,
}

impl FileRecord {
    pub fn new(
        filename: String,
        filesize: u64,
        chunk_size: u64,
        replication_factor: u32,
        commits: Vec<ChunkCommit>,
    ) -> Self {
        let mut chunks: Vec<ChunkPlacement> = commits
            .into_iter()
            .map(|commit| ChunkPlacement {
                chunk_id: commit.chunk_id,
                chunk_index: commit.chunk_index,
                replicas: commit.locations,
            })
            .collect();
        chunks.sort_by_key(|placement| placement.chunk_index);
        Self {
            filename,
            filesize,
            chunk_size,
            replication_factor,
            created_at: unix_now(),
            chunks,
        }
    }
    pub fn chunk_count(&self) -> u64 {
        self.chunks.len() as u64
    }
    /// Strips the given datanode ids out of every placement. Returns how
    /// many chunks are left with no replica at all.
    pub fn strip_locations(&mut self, dead: &HashSet<String>) -> usize {
        let mut lost = 0;
        for placement in &mut self.chunks {
            placement.replicas.retain(|node_id| !dead.contains(node_id));
            if placement.replicas.is_empty() {
                lost += 1;
            }
        }
        lost
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod test {
    use super::*;

    fn commit(chunk_id: &str, chunk_index: u64, locations: &[&str]) -> ChunkCommit {
        ChunkCommit {
            chunk_id: chunk_id.to_owned(),
            chunk_index,
            locations: locations.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn placements_are_ordered_by_chunk_index() {
        let record = FileRecord::new(
            "a.bin".to_owned(),
            3 * 1024,
            1024,
            3,
            vec![
                commit("chunk_a.bin_2", 2, &["dn_1"]),
                commit("chunk_a.bin_0", 0, &["dn_2"]),
                commit("chunk_a.bin_1", 1, &["dn_3"]),
            ],
        );
        let ids: Vec<_> = record.chunks.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, ["chunk_a.bin_0", "chunk_a.bin_1", "chunk_a.bin_2"]);
    }

    #[test]
    fn stripping_dead_nodes_reports_lost_chunks() {
        let mut record = FileRecord::new(
            "a.bin".to_owned(),
            2 * 1024,
            1024,
            2,
            vec![
                commit("chunk_a.bin_0", 0, &["dn_1", "dn_2"]),
                commit("chunk_a.bin_1", 1, &["dn_1"]),
            ],
        );
        let dead: HashSet<String> = ["dn_1".to_owned()].into_iter().collect();
        let lost = record.strip_locations(&dead);
        assert_eq!(lost, 1);
        assert_eq!(record.chunks[0].replicas, vec!["dn_2".to_owned()]);
        assert!(record.chunks[1].replicas.is_empty());
    }
}
