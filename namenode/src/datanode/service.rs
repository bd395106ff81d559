use std::time::Duration;

use proto::messages::{Ack, DatanodeRequest, RemoteError, Reply};
use proto::wire;
use tokio::time::timeout;
use utilities::{
    logger::{instrument, tracing},
    result::Result,
    tcp_pool::TCP_CONNECTION_POOL,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Namenode-side calls into datanodes. Only best-effort chunk deletion is
/// needed here; chunk bytes never pass through the namenode.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatanodeService {}

impl DatanodeService {
    pub fn new() -> Self {
        Self {}
    }

    #[instrument(name = "namenode_delete_chunk", skip(self))]
    pub async fn delete_chunk(&self, datanode_addr: &str, chunk_id: &str) -> Result<()> {
        let request = DatanodeRequest::DeleteChunk {
            chunk_id: chunk_id.to_owned(),
        };
        let exchange = async {
            let mut stream = TCP_CONNECTION_POOL.get_connection(datanode_addr).await?;
            let reply: Reply<Ack> = wire::call(&mut stream, &request).await?;
            reply.into_result()?;
            Ok(())
        };
        match timeout(REQUEST_TIMEOUT, exchange).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::transport(format!(
                "delete_chunk to {datanode_addr} timed out"
            ))
            .into()),
        }
    }
}
