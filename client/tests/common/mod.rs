#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use datanode::client_handler::ClientHandler;
use datanode::datanode_server::DatanodeServer;
use datanode::namenode_service::NamenodeService as DatanodeNamenodeService;
use datanode::state_maintainer::StateMaintainer as HeartbeatLoop;
use namenode::config::Config as NamenodeConfig;
use namenode::namenode_server::NamenodeServer;
use namenode::namenode_state::NamenodeState;
use namenode::state_maintainer::StateMaintainer;
use storage::file_storage::{FileStorage, FileStorageConfig};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub const MIB: u64 = 1024 * 1024;

/// Namenode tuned for tests: 1 MiB chunks, fast heartbeats, a liveness
/// window a test can wait out, and a housekeeper too slow to interfere.
pub fn test_namenode_config(replication: u32) -> NamenodeConfig {
    NamenodeConfig {
        chunk_size: MIB,
        replication,
        heartbeat_interval_ms: 100,
        liveness_timeout_ms: 500,
        housekeeping_interval_ms: 60_000,
        ..NamenodeConfig::default()
    }
}

pub struct TestNamenode {
    pub addr: String,
    pub config: NamenodeConfig,
    tasks: Vec<JoinHandle<()>>,
}

impl Drop for TestNamenode {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

pub async fn start_namenode(config: NamenodeConfig) -> TestNamenode {
    config.validate().expect("test config must be valid");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let state = Arc::new(Mutex::new(NamenodeState::new()));
    let maintainer = StateMaintainer::new(
        state.clone(),
        config.liveness_timeout(),
        config.housekeeping_interval(),
    );
    let maintainer_task = maintainer.start();
    let server = NamenodeServer::new(state, &config);
    let server_task = tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    TestNamenode {
        addr,
        config,
        tasks: vec![server_task, maintainer_task],
    }
}

pub struct TestDatanode {
    pub node_id: String,
    pub addr: String,
    tasks: Vec<JoinHandle<()>>,
    _storage_dir: TempDir,
}

impl TestDatanode {
    /// Stops the server and the heartbeat loop; the namenode will age the
    /// node out once its liveness window passes.
    pub fn kill(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl Drop for TestDatanode {
    fn drop(&mut self) {
        self.kill();
    }
}

pub async fn start_datanode(
    namenode_addr: &str,
    node_id: &str,
    capacity_bytes: u64,
    heartbeat_interval: Duration,
) -> TestDatanode {
    let storage_dir = tempfile::tempdir().unwrap();
    let store = FileStorage::new(FileStorageConfig {
        root: storage_dir.path().join("chunks"),
        capacity_bytes,
    })
    .await
    .unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let local_addr = listener.local_addr().unwrap();

    let namenode_service = DatanodeNamenodeService::new(
        namenode_addr.to_owned(),
        node_id.to_owned(),
        local_addr.ip().to_string(),
        local_addr.port(),
    );
    namenode_service.register(capacity_bytes).await.unwrap();
    let heartbeat_task = HeartbeatLoop::new(store.clone(), namenode_service, heartbeat_interval).start();

    let server = DatanodeServer::new(ClientHandler::new(store));
    let server_task = tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    TestDatanode {
        node_id: node_id.to_owned(),
        addr: local_addr.to_string(),
        tasks: vec![server_task, heartbeat_task],
        _storage_dir: storage_dir,
    }
}

pub struct TestCluster {
    pub namenode: TestNamenode,
    pub datanodes: Vec<TestDatanode>,
    pub workspace: TempDir,
}

impl TestCluster {
    pub fn local_path(&self, name: &str) -> String {
        self.workspace
            .path()
            .join(name)
            .to_string_lossy()
            .into_owned()
    }
}

/// Namenode plus `capacities_mib.len()` datanodes, heartbeating every
/// 100ms so liveness settles quickly.
pub async fn start_cluster(replication: u32, capacities_mib: &[u64]) -> TestCluster {
    let namenode = start_namenode(test_namenode_config(replication)).await;
    let mut datanodes = Vec::with_capacity(capacities_mib.len());
    for (index, capacity) in capacities_mib.iter().enumerate() {
        datanodes.push(
            start_datanode(
                &namenode.addr,
                &format!("dn_{}", index + 1),
                capacity * MIB,
                Duration::from_millis(100),
            )
            .await,
        );
    }
    TestCluster {
        namenode,
        datanodes,
        workspace: tempfile::tempdir().unwrap(),
    }
}
