use std::time::Duration;

use proto::messages::{
    Ack, ChunkCommit, ClusterSummary, DownloadPlan, FileDetails, FileList, NamenodeRequest,
    RemoteError, Reply, UploadPlan,
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

/// Typed client calls to the namenode. Every operation opens a fresh
/// connection and carries a timeout; nothing is retried here.
#[derive(Debug, Clone)]
pub struct NamenodeService {
    namenode_addr: String,
}

impl NamenodeService {
    pub fn new(namenode_addr: String) -> Self {
        Self { namenode_addr }
    }

    async fn call<T: DeserializeOwned>(&self, request: &NamenodeRequest) -> Result<T> {
        let exchange = async {
            let mut stream = TCP_CONNECTION_POOL
                .get_connection(&self.namenode_addr)
                .await?;
            let reply: Reply<T> = wire::call(&mut stream, request).await?;
            Ok(reply.into_result()?)
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

    #[instrument(name = "client_call_upload_init", skip(self))]
    pub async fn upload_init(&self, filename: &str, filesize: u64) -> Result<UploadPlan> {
        self.call(&NamenodeRequest::UploadInit {
            filename: filename.to_owned(),
            filesize,
        })
        .await
    }

    #[instrument(name = "client_call_upload_complete", skip(self, chunks))]
    pub async fn upload_complete(
        &self,
        filename: &str,
        filesize: u64,
        chunks: Vec<ChunkCommit>,
    ) -> Result<()> {
        let _: Ack = self
            .call(&NamenodeRequest::UploadComplete {
                filename: filename.to_owned(),
                filesize,
                chunks,
            })
            .await?;
        Ok(())
    }

    #[instrument(name = "client_call_download_init", skip(self))]
    pub async fn download_init(&self, filename: &str) -> Result<DownloadPlan> {
        self.call(&NamenodeRequest::DownloadInit {
            filename: filename.to_owned(),
        })
        .await
    }

    pub async fn list_files(&self) -> Result<FileList> {
        self.call(&NamenodeRequest::ListFiles).await
    }

    pub async fn file_info(&self, filename: &str) -> Result<FileDetails> {
        self.call(&NamenodeRequest::FileInfo {
            filename: filename.to_owned(),
        })
        .await
    }

    #[instrument(name = "client_call_delete_file", skip(self))]
    pub async fn delete_file(&self, filename: &str) -> Result<()> {
        let _: Ack = self
            .call(&NamenodeRequest::DeleteFile {
                filename: filename.to_owned(),
            })
            .await?;
        Ok(())
    }

    pub async fn cluster_status(&self) -> Result<ClusterSummary> {
        self.call(&NamenodeRequest::ClusterStatus).await
    }
}
