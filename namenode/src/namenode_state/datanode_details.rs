use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

use proto::messages::{DatanodeMeta, DatanodeStatus};

/// The namenode's view of one datanode. There is no dead state machine:
/// liveness is derived from the heartbeat age on every read.
#[derive(Debug, Clone)]
pub struct DatanodeDetail {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub total_space: u64,
    pub available_space: u64,
    pub chunks: HashSet<String>,
    pub last_heartbeat: Instant,
}

impl DatanodeDetail {
    pub fn new(id: String, host: String, port: u16, total_space: u64) -> Self {
        Self {
            id,
            host,
            port,
            total_space,
            available_space: total_space,
            chunks: HashSet::default(),
            last_heartbeat: Instant::now(),
        }
    }
    /// Descriptor created from a heartbeat whose node id was never
    /// registered. It has no usable address until the node re-registers.
    pub fn placeholder(id: String) -> Self {
        Self::new(id, String::new(), 0, 0)
    }
    /// Re-registration refreshes the address and capacity and resets
    /// liveness; datanodes restart independently.
    pub fn register(&mut self, host: String, port: u16, total_space: u64) {
        self.host = host;
        self.port = port;
        self.total_space = total_space;
        if self.available_space > total_space {
            self.available_space = total_space;
        }
        self.mark_heartbeat();
    }
    pub fn apply_heartbeat(&mut self, available_space: u64, total_space: u64, chunks: Vec<String>) {
        self.available_space = available_space;
        self.total_space = total_space;
        self.chunks = chunks.into_iter().collect();
        self.mark_heartbeat();
    }
    pub fn mark_heartbeat(&mut self) {
        self.last_heartbeat = Instant::now();
    }
    pub fn is_alive(&self, liveness_timeout: Duration) -> bool {
        self.last_heartbeat.elapsed() <= liveness_timeout
    }
    pub fn has_addr(&self) -> bool {
        !self.host.is_empty() && self.port != 0
    }
    pub fn meta(&self) -> DatanodeMeta {
        DatanodeMeta {
            node_id: self.id.clone(),
            host: self.host.clone(),
            port: self.port,
        }
    }
    pub fn status(&self, liveness_timeout: Duration) -> DatanodeStatus {
        DatanodeStatus {
            node_id: self.id.clone(),
            host: self.host.clone(),
            port: self.port,
            alive: self.is_alive(liveness_timeout),
            chunk_count: self.chunks.len() as u64,
            available_space: self.available_space,
            total_space: self.total_space,
        }
    }
}
