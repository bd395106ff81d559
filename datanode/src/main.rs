use datanode::client_handler::ClientHandler;
use datanode::config::CONFIG;
use datanode::datanode_server::DatanodeServer;
use datanode::namenode_service::NamenodeService;
use datanode::state_maintainer::StateMaintainer;
use storage::file_storage::{FileStorage, FileStorageConfig};
use tokio::net::TcpListener;
use utilities::logger::{error, info, init_logger};
use utilities::result::Result;
use utilities::retry_policy::retry_with_backoff;

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_logger("Datanode", &CONFIG.id);
    let bind_addr = format!("{}:{}", CONFIG.host, CONFIG.port);
    info!(
        addr=%bind_addr,
        storage_root=%CONFIG.storage_root,
        namenode=%CONFIG.namenode_addr,
        "Starting the datanode server"
    );
    let store = FileStorage::new(FileStorageConfig {
        root: CONFIG.storage_root.clone().into(),
        capacity_bytes: CONFIG.capacity_bytes,
    })
    .await?;
    let listener = TcpListener::bind(&bind_addr).await?;

    // registration first; the server only becomes useful once the
    // namenode can hand out this address
    let namenode_service = NamenodeService::new(
        CONFIG.namenode_addr.clone(),
        CONFIG.id.clone(),
        CONFIG.host.clone(),
        CONFIG.port,
    );
    retry_with_backoff(|| namenode_service.register(CONFIG.capacity_bytes), 8).await?;

    let state_maintainer = StateMaintainer::new(
        store.clone(),
        namenode_service.clone(),
        CONFIG.heartbeat_interval(),
    );
    let _heartbeat_loop = state_maintainer.start();

    let server = DatanodeServer::new(ClientHandler::new(store));
    tokio::select! {
        result = server.serve(listener) => {
            if let Err(e) = result {
                error!(error=%e, "Datanode server stopped unexpectedly");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down the datanode");
        }
    }
    Ok(())
}
