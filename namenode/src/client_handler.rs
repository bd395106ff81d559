use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use proto::messages::{
    Ack, ChunkCommit, ClusterSummary, ChunkInfo, DatanodeMeta, DownloadPlan, FileDetails,
    FileList, FileSummary, PlanEntry, RemoteError, Reply, UploadPlan,
};
use tokio::sync::Mutex;
use utilities::logger::{info, instrument, tracing, warn};

use crate::{
    chunk_generator::{ChunkGenerator, DefaultChunkGenerator},
    config::Config,
    datanode::selection_policy::default_selection_policy::DefaultDatanodeSelectionPolicy,
    datanode::selection_policy::selection_policy::DatanodeSelectionPolicy,
    datanode::service::DatanodeService,
    namenode_state::{NamenodeState, file_record::FileRecord},
};

/// Handles the client-facing namespace operations.
pub struct ClientHandler {
    state: Arc<Mutex<NamenodeState>>,
    datanode_selector: Box<dyn DatanodeSelectionPolicy + Send + Sync>,
    chunk_generator: Box<dyn ChunkGenerator + Send + Sync>,
    datanode_service: DatanodeService,
    chunk_size: u64,
    replication: u32,
    liveness_timeout: Duration,
}

impl ClientHandler {
    pub fn new(state: Arc<Mutex<NamenodeState>>, config: &Config) -> Self {
        let datanode_selector = Box::new(DefaultDatanodeSelectionPolicy::new(
            state.clone(),
            config.replication,
            config.liveness_timeout(),
        ));
        let chunk_generator = Box::new(DefaultChunkGenerator::new(config.chunk_size));
        Self {
            state,
            datanode_selector,
            chunk_generator,
            datanode_service: DatanodeService::new(),
            chunk_size: config.chunk_size,
            replication: config.replication,
            liveness_timeout: config.liveness_timeout(),
        }
    }

    /// Returns a placement proposal. No file record is created here; the
    /// namespace only changes at upload_complete.
    #[instrument(name = "client_upload_init", skip(self))]
    pub async fn upload_init(&self, filename: String, filesize: u64) -> Reply<UploadPlan> {
        let alive = self
            .state
            .lock()
            .await
            .alive_datanode_count(self.liveness_timeout);
        if alive < self.replication as usize {
            return Reply::Error(RemoteError::insufficient_capacity(format!(
                "Insufficient datanodes. Need {}, found {alive}",
                self.replication
            )));
        }
        let chunk_bounds = self.chunk_generator.get_chunks(&filename, filesize);
        let mut plan = Vec::with_capacity(chunk_bounds.len());
        for bounds in chunk_bounds {
            match self.datanode_selector.select_replicas(bounds.chunk_index).await {
                Ok(datanodes) => plan.push(PlanEntry {
                    chunk_id: bounds.chunk_id,
                    chunk_index: bounds.chunk_index,
                    datanodes,
                }),
                Err(e) => return Reply::Error(e),
            }
        }
        Reply::ok(UploadPlan {
            chunk_size: self.chunk_size,
            replication_factor: self.replication,
            plan,
        })
    }

    /// Records the placements the client reports. Replacing an existing
    /// record is allowed: the last writer wins.
    #[instrument(name = "client_upload_complete", skip(self, chunks))]
    pub async fn upload_complete(
        &self,
        filename: String,
        filesize: u64,
        chunks: Vec<ChunkCommit>,
    ) -> Reply<Ack> {
        let record = FileRecord::new(
            filename.clone(),
            filesize,
            self.chunk_size,
            self.replication,
            chunks,
        );
        let chunk_count = record.chunk_count();
        let mut state = self.state.lock().await;
        state.files.insert(filename.clone(), record);
        drop(state);
        info!(%filename, %filesize, %chunk_count, "File record committed");
        Reply::ok(Ack {})
    }

    /// The per-chunk address lists are filtered to currently-live
    /// datanodes; a chunk with no live replica comes back with an empty
    /// list and the client fails that chunk.
    #[instrument(name = "client_download_init", skip(self))]
    pub async fn download_init(&self, filename: String) -> Reply<DownloadPlan> {
        let state = self.state.lock().await;
        let Some(record) = state.files.get(&filename) else {
            return Reply::Error(RemoteError::not_found(format!("File not found: {filename}")));
        };
        let chunks = record
            .chunks
            .iter()
            .map(|placement| PlanEntry {
                chunk_id: placement.chunk_id.clone(),
                chunk_index: placement.chunk_index,
                datanodes: self.live_metas(&state, &placement.replicas),
            })
            .collect();
        Reply::ok(DownloadPlan {
            filesize: record.filesize,
            chunk_size: record.chunk_size,
            chunks,
        })
    }

    #[instrument(name = "client_list_files", skip(self))]
    pub async fn list_files(&self) -> Reply<FileList> {
        let state = self.state.lock().await;
        let mut files: Vec<FileSummary> = state
            .files
            .values()
            .map(|record| FileSummary {
                filename: record.filename.clone(),
                filesize: record.filesize,
                chunk_count: record.chunk_count(),
                created_at: record.created_at,
            })
            .collect();
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Reply::ok(FileList { files })
    }

    #[instrument(name = "client_file_info", skip(self))]
    pub async fn file_info(&self, filename: String) -> Reply<FileDetails> {
        let state = self.state.lock().await;
        let Some(record) = state.files.get(&filename) else {
            return Reply::Error(RemoteError::not_found(format!("File not found: {filename}")));
        };
        let chunks = record
            .chunks
            .iter()
            .map(|placement| ChunkInfo {
                chunk_id: placement.chunk_id.clone(),
                chunk_index: placement.chunk_index,
                locations: placement.replicas.clone(),
                datanodes: self.live_metas(&state, &placement.replicas),
            })
            .collect();
        Reply::ok(FileDetails {
            filename: record.filename.clone(),
            filesize: record.filesize,
            chunk_size: record.chunk_size,
            replication_factor: record.replication_factor,
            created_at: record.created_at,
            chunks,
        })
    }

    /// Removes the record and issues best-effort chunk deletes to every
    /// datanode that had a replica. The fan-out is awaited before the
    /// reply so a following re-upload of the same filename cannot race
    /// the old chunks; individual failures only orphan chunks.
    #[instrument(name = "client_delete_file", skip(self))]
    pub async fn delete_file(&self, filename: String) -> Reply<Ack> {
        let mut state = self.state.lock().await;
        let Some(record) = state.files.remove(&filename) else {
            // deleting a non-existent file is not an error
            return Reply::ok(Ack {});
        };
        let mut targets: Vec<(String, String)> = vec![];
        for placement in &record.chunks {
            for node_id in &placement.replicas {
                if let Some(datanode) = state.datanodes.get(node_id) {
                    if datanode.has_addr() {
                        targets.push((datanode.meta().addr(), placement.chunk_id.clone()));
                    }
                }
            }
        }
        drop(state);

        let deletes = targets
            .iter()
            .map(|(addr, chunk_id)| self.datanode_service.delete_chunk(addr, chunk_id));
        for ((addr, chunk_id), result) in targets.iter().zip(join_all(deletes).await) {
            if let Err(e) = result {
                warn!(%addr, %chunk_id, error=%e, "Best-effort chunk delete failed; chunk is orphaned");
            }
        }
        info!(%filename, "File deleted");
        Reply::ok(Ack {})
    }

    #[instrument(name = "client_cluster_status", skip(self))]
    pub async fn cluster_status(&self) -> Reply<ClusterSummary> {
        let state = self.state.lock().await;
        let mut datanodes: Vec<_> = state
            .datanodes
            .values()
            .map(|datanode| datanode.status(self.liveness_timeout))
            .collect();
        datanodes.sort_by(|a, b| a.node_id.cmp(&b.node_id));
        Reply::ok(ClusterSummary {
            total_files: state.files.len() as u64,
            total_bytes: state.files.values().map(|record| record.filesize).sum(),
            datanodes,
        })
    }

    fn live_metas(&self, state: &NamenodeState, replicas: &[String]) -> Vec<DatanodeMeta> {
        replicas
            .iter()
            .filter_map(|node_id| state.datanodes.get(node_id))
            .filter(|datanode| datanode.is_alive(self.liveness_timeout) && datanode.has_addr())
            .map(|datanode| datanode.meta())
            .collect()
    }
}
