use std::time::Duration;

use proto::messages::{
    ChunkData, DatanodeMeta, DatanodeRequest, RemoteError, Reply, StoredChunk, decode_chunk,
    encode_chunk,
};
use proto::wire;
use serde::de::DeserializeOwned;
use tokio::time::timeout;
use utilities::{
    logger::{instrument, tracing},
    result::Result,
    tcp_pool::TCP_CONNECTION_POOL,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Moves chunk bytes between the client and datanodes. File bytes never
/// pass through the namenode.
#[derive(Debug, Clone, Default)]
pub struct DatanodeService {}

impl DatanodeService {
    pub fn new() -> Self {
        Self {}
    }

    async fn call<T: DeserializeOwned>(
        &self,
        datanode: &DatanodeMeta,
        request: &DatanodeRequest,
    ) -> Result<T> {
        let addr = datanode.addr();
        let exchange = async {
            let mut stream = TCP_CONNECTION_POOL.get_connection(&addr).await?;
            let reply: Reply<T> = wire::call(&mut stream, request).await?;
            Ok(reply.into_result()?)
        };
        match timeout(REQUEST_TIMEOUT, exchange).await {
            Ok(result) => result,
            Err(_) => {
                Err(RemoteError::transport(format!("call to datanode at {addr} timed out")).into())
            }
        }
    }

    /// The chunk counts as stored only when the datanode acknowledges it.
    #[instrument(name = "client_store_chunk", skip(self, bytes), fields(datanode = %datanode.node_id))]
    pub async fn store_chunk(
        &self,
        datanode: &DatanodeMeta,
        chunk_id: &str,
        bytes: &[u8],
    ) -> Result<StoredChunk> {
        self.call(
            datanode,
            &DatanodeRequest::StoreChunk {
                chunk_id: chunk_id.to_owned(),
                data: encode_chunk(bytes),
            },
        )
        .await
    }

    #[instrument(name = "client_retrieve_chunk", skip(self), fields(datanode = %datanode.node_id))]
    pub async fn retrieve_chunk(&self, datanode: &DatanodeMeta, chunk_id: &str) -> Result<Vec<u8>> {
        let chunk: ChunkData = self
            .call(
                datanode,
                &DatanodeRequest::RetrieveChunk {
                    chunk_id: chunk_id.to_owned(),
                },
            )
            .await?;
        Ok(decode_chunk(&chunk.data)?)
    }
}
