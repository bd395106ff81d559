use async_trait::async_trait;
use proto::messages::{DatanodeMeta, RemoteError};

#[async_trait]
pub trait DatanodeSelectionPolicy {
    /// Picks the replica targets for one chunk. Every chunk gets R distinct
    /// datanodes or the selection fails with insufficient_capacity.
    async fn select_replicas(&self, chunk_index: u64) -> Result<Vec<DatanodeMeta>, RemoteError>;
}
