use std::sync::Arc;

use proto::messages::DatanodeRequest;
use proto::wire;
use tokio::net::{TcpListener, TcpStream};
use utilities::{
    logger::{Instrument, Span, error},
    result::Result,
};

use crate::client_handler::ClientHandler;

/// Accepts connections and serves decoded chunk requests until the peer
/// closes the stream.
pub struct DatanodeServer {
    client_handler: Arc<ClientHandler>,
}

impl DatanodeServer {
    pub fn new(client_handler: ClientHandler) -> Self {
        Self {
            client_handler: Arc::new(client_handler),
        }
    }

    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        loop {
            let (tcp_stream, _) = listener.accept().await?;
            let client_handler = self.client_handler.clone();
            let span = Span::current();
            tokio::spawn(
                async move {
                    if let Err(e) = Self::handle_connection(tcp_stream, client_handler).await {
                        error!("error while handling a datanode connection {e}");
                    }
                }
                .instrument(span),
            );
        }
    }

    async fn handle_connection(
        mut stream: TcpStream,
        client_handler: Arc<ClientHandler>,
    ) -> Result<()> {
        while let Some(request) = wire::read_frame::<DatanodeRequest>(&mut stream).await? {
            match request {
                DatanodeRequest::StoreChunk { chunk_id, data } => {
                    let reply = client_handler.store_chunk(chunk_id, data).await;
                    wire::write_frame(&mut stream, &reply).await?;
                }
                DatanodeRequest::RetrieveChunk { chunk_id } => {
                    let reply = client_handler.retrieve_chunk(chunk_id).await;
                    wire::write_frame(&mut stream, &reply).await?;
                }
                DatanodeRequest::DeleteChunk { chunk_id } => {
                    let reply = client_handler.delete_chunk(chunk_id).await;
                    wire::write_frame(&mut stream, &reply).await?;
                }
            }
        }
        Ok(())
    }
}
