use std::time::Duration;

use proto::messages::{Ack, NamenodeRequest, RemoteError, Reply};
use proto::wire;
use tokio::time::timeout;
use utilities::{
    logger::{info, instrument, tracing},
    result::Result,
    tcp_pool::TCP_CONNECTION_POOL,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Datanode-side calls to the namenode: registration at startup and the
/// periodic heartbeat.
#[derive(Clone)]
pub struct NamenodeService {
    namenode_addr: String,
    node_id: String,
    host: String,
    port: u16,
}

impl NamenodeService {
    pub fn new(namenode_addr: String, node_id: String, host: String, port: u16) -> Self {
        Self {
            namenode_addr,
            node_id,
            host,
            port,
        }
    }

    async fn call(&self, request: &NamenodeRequest) -> Result<()> {
        let exchange = async {
            let mut stream = TCP_CONNECTION_POOL
                .get_connection(&self.namenode_addr)
                .await?;
            let reply: Reply<Ack> = wire::call(&mut stream, request).await?;
            reply.into_result()?;
            Ok(())
        };
        match timeout(REQUEST_TIMEOUT, exchange).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::transport(format!(
                "call to namenode at {} timed out",
                self.namenode_addr
            ))
            .into()),
        }
    }

    #[instrument(name = "datanode_register_with_namenode", skip(self))]
    pub async fn register(&self, total_space: u64) -> Result<()> {
        self.call(&NamenodeRequest::RegisterDatanode {
            node_id: self.node_id.clone(),
            host: self.host.clone(),
            port: self.port,
            total_space,
        })
        .await?;
        info!(namenode=%self.namenode_addr, "Registered with the namenode");
        Ok(())
    }

    pub async fn send_heartbeat(
        &self,
        available_space: u64,
        total_space: u64,
        chunks: Vec<String>,
    ) -> Result<()> {
        self.call(&NamenodeRequest::Heartbeat {
            node_id: self.node_id.clone(),
            available_space,
            total_space,
            chunks,
        })
        .await
    }
}
