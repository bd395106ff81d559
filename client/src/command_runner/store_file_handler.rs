use futures::future::try_join_all;
use proto::messages::ChunkCommit;
use utilities::{
    logger::{info, instrument, trace, tracing},
    result::Result,
};

use crate::{
    datanode_service::DatanodeService, file_chunker::FileChunker,
    namenode_service::NamenodeService,
};

pub struct StoreFileHandler {
    namenode: NamenodeService,
    datanode: DatanodeService,
}

impl StoreFileHandler {
    pub fn new(namenode: NamenodeService, datanode: DatanodeService) -> Self {
        Self { namenode, datanode }
    }

    /// Two-phase upload: obtain a placement plan, push every chunk to every
    /// replica target, then commit the placements. A chunk only counts as
    /// stored when all its targets acknowledge; the first failure aborts the
    /// in-flight chunks and no file record is created.
    #[instrument(skip(self))]
    pub async fn store_file(
        &self,
        local_file_path: String,
        remote_file_name: String,
    ) -> Result<String> {
        trace!("Fetching file metadata");
        let file_metadata = tokio::fs::metadata(&local_file_path)
            .await
            .map_err(|e| format!("Error while reading file metadata : {e:?}"))?;
        if file_metadata.is_dir() {
            return Err(format!("Provided file path ({local_file_path}) is a dir").into());
        }
        let filesize = file_metadata.len();
        info!(%filesize, "Requesting an upload plan");
        let upload_plan = self.namenode.upload_init(&remote_file_name, filesize).await?;
        trace!(chunks = upload_plan.plan.len(), "Got upload plan");

        let file_chunker = FileChunker::new(local_file_path, upload_plan.chunk_size);
        let uploads = upload_plan.plan.iter().map(|entry| {
            let file_chunker = &file_chunker;
            async move {
                trace!(chunk_id = %entry.chunk_id, "working on chunk");
                let bytes = file_chunker.read_chunk(entry.chunk_index).await?;
                for datanode_meta in &entry.datanodes {
                    self.datanode
                        .store_chunk(datanode_meta, &entry.chunk_id, &bytes)
                        .await?;
                }
                Ok::<_, Box<dyn std::error::Error + Send + Sync>>(ChunkCommit {
                    chunk_id: entry.chunk_id.clone(),
                    chunk_index: entry.chunk_index,
                    locations: entry
                        .datanodes
                        .iter()
                        .map(|datanode_meta| datanode_meta.node_id.clone())
                        .collect(),
                })
            }
        });
        let chunks = try_join_all(uploads).await?;

        self.namenode
            .upload_complete(&remote_file_name, filesize, chunks)
            .await?;
        Ok(format!("File {remote_file_name} stored successfully"))
    }
}
