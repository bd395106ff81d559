use futures::future::try_join_all;
use utilities::{
    logger::{error, info, instrument, trace, tracing},
    result::Result,
};

use crate::{
    chunk_joiner::ChunkJoiner, datanode_service::DatanodeService,
    namenode_service::NamenodeService,
};

pub struct FetchFileHandler {
    namenode: NamenodeService,
    datanode: DatanodeService,
}

impl FetchFileHandler {
    pub fn new(namenode: NamenodeService, datanode: DatanodeService) -> Self {
        Self { namenode, datanode }
    }

    /// Downloads every chunk, failing over across the live replicas in the
    /// order the namenode returned them. All replicas failing for any chunk
    /// aborts the download and removes the partial file.
    #[instrument(skip(self))]
    pub async fn fetch_file(
        &self,
        remote_file_name: String,
        local_file_path: String,
    ) -> Result<String> {
        trace!("Requesting chunk locations");
        let download_plan = self.namenode.download_init(&remote_file_name).await?;
        trace!(chunks = download_plan.chunks.len(), "Got download plan");
        let chunk_joiner = ChunkJoiner::new(local_file_path.clone(), download_plan.filesize).await?;

        let remote_file_name = remote_file_name.as_str();
        let downloads = download_plan.chunks.iter().map(|entry| {
            let chunk_joiner = chunk_joiner.clone();
            let chunk_size = download_plan.chunk_size;
            async move {
                for datanode_meta in &entry.datanodes {
                    match self
                        .datanode
                        .retrieve_chunk(datanode_meta, &entry.chunk_id)
                        .await
                    {
                        Ok(bytes) => {
                            chunk_joiner
                                .join_chunk(entry.chunk_index, chunk_size, &bytes)
                                .await?;
                            return Ok(());
                        }
                        Err(e) => {
                            // try the next replica, no backoff
                            error!(chunk_id = %entry.chunk_id, datanode = %datanode_meta.node_id, error = %e, "Replica failed, trying the next one");
                        }
                    }
                }
                Err(format!(
                    "No live replica could serve chunk {} of {}",
                    entry.chunk_id, remote_file_name
                )
                .into())
            }
        });
        let result: Result<Vec<()>> = try_join_all(downloads).await;
        if let Err(e) = result {
            info!("Download failed, removing the partial file");
            chunk_joiner.abort().await;
            return Err(e);
        }
        Ok(format!("File fetched successfully to {local_file_path}"))
    }
}
