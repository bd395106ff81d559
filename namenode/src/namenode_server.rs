use std::sync::Arc;

use proto::messages::NamenodeRequest;
use proto::wire;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::Mutex,
};
use utilities::{
    logger::{Instrument, Span, error},
    result::Result,
};

use crate::{
    client_handler::ClientHandler, config::Config, datanode::handler::DatanodeHandler,
    namenode_state::NamenodeState,
};

/// Accepts connections and dispatches decoded request frames to the two
/// handlers. A connection serves frames in a loop until the peer closes.
pub struct NamenodeServer {
    client_handler: Arc<ClientHandler>,
    datanode_handler: Arc<DatanodeHandler>,
}

impl NamenodeServer {
    pub fn new(state: Arc<Mutex<NamenodeState>>, config: &Config) -> Self {
        Self {
            client_handler: Arc::new(ClientHandler::new(state.clone(), config)),
            datanode_handler: Arc::new(DatanodeHandler::new(state)),
        }
    }

    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        loop {
            let (tcp_stream, _) = listener.accept().await?;
            let client_handler = self.client_handler.clone();
            let datanode_handler = self.datanode_handler.clone();
            let span = Span::current();
            tokio::spawn(
                async move {
                    if let Err(e) =
                        Self::handle_connection(tcp_stream, client_handler, datanode_handler).await
                    {
                        error!("error while handling a namenode connection {e}");
                    }
                }
                .instrument(span),
            );
        }
    }

    async fn handle_connection(
        mut stream: TcpStream,
        client_handler: Arc<ClientHandler>,
        datanode_handler: Arc<DatanodeHandler>,
    ) -> Result<()> {
        while let Some(request) = wire::read_frame::<NamenodeRequest>(&mut stream).await? {
            match request {
                NamenodeRequest::RegisterDatanode {
                    node_id,
                    host,
                    port,
                    total_space,
                } => {
                    let reply = datanode_handler
                        .register_datanode(node_id, host, port, total_space)
                        .await;
                    wire::write_frame(&mut stream, &reply).await?;
                }
                NamenodeRequest::Heartbeat {
                    node_id,
                    available_space,
                    total_space,
                    chunks,
                } => {
                    let reply = datanode_handler
                        .heartbeat(node_id, available_space, total_space, chunks)
                        .await;
                    wire::write_frame(&mut stream, &reply).await?;
                }
                NamenodeRequest::UploadInit { filename, filesize } => {
                    let reply = client_handler.upload_init(filename, filesize).await;
                    wire::write_frame(&mut stream, &reply).await?;
                }
                NamenodeRequest::UploadComplete {
                    filename,
                    filesize,
                    chunks,
                } => {
                    let reply = client_handler
                        .upload_complete(filename, filesize, chunks)
                        .await;
                    wire::write_frame(&mut stream, &reply).await?;
                }
                NamenodeRequest::DownloadInit { filename } => {
                    let reply = client_handler.download_init(filename).await;
                    wire::write_frame(&mut stream, &reply).await?;
                }
                NamenodeRequest::ListFiles => {
                    let reply = client_handler.list_files().await;
                    wire::write_frame(&mut stream, &reply).await?;
                }
                NamenodeRequest::FileInfo { filename } => {
                    let reply = client_handler.file_info(filename).await;
                    wire::write_frame(&mut stream, &reply).await?;
                }
                NamenodeRequest::DeleteFile { filename } => {
                    let reply = client_handler.delete_file(filename).await;
                    wire::write_frame(&mut stream, &reply).await?;
                }
                NamenodeRequest::ClusterStatus => {
                    let reply = client_handler.cluster_status().await;
                    wire::write_frame(&mut stream, &reply).await?;
                }
            }
        }
        Ok(())
    }
}
