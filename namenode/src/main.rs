use std::sync::Arc;

use namenode::config::CONFIG;
use namenode::namenode_server::NamenodeServer;
use namenode::namenode_state::NamenodeState;
use namenode::state_maintainer::StateMaintainer;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use utilities::logger::{error, info, init_logger};
use utilities::result::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_logger("Namenode", &CONFIG.id);
    if let Err(e) = CONFIG.validate() {
        error!(error=%e, "Invalid configuration, shutting down");
        return Err(e.into());
    }
    let bind_addr = format!("{}:{}", CONFIG.host, CONFIG.port);
    info!(
        addr=%bind_addr,
        chunk_size=%CONFIG.chunk_size,
        replication=%CONFIG.replication,
        "Starting the namenode server"
    );
    let listener = TcpListener::bind(&bind_addr).await?;

    let state = Arc::new(Mutex::new(NamenodeState::new()));
    let state_maintainer = StateMaintainer::new(
        state.clone(),
        CONFIG.liveness_timeout(),
        CONFIG.housekeeping_interval(),
    );
    let _housekeeper = state_maintainer.start();

    let server = NamenodeServer::new(state, &CONFIG);
    tokio::select! {
        result = server.serve(listener) => {
            if let Err(e) = result {
                error!(error=%e, "Namenode server stopped unexpectedly");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down the namenode");
        }
    }
    Ok(())
}
