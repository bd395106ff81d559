use std::sync::Arc;

use tokio::sync::Mutex;
use utilities::logger::{info, instrument, tracing};

use crate::namenode_state::NamenodeState;
use crate::namenode_state::datanode_details::DatanodeDetail;

use proto::messages::{Ack, Reply};

/// Handles the datanode-facing operations: registration and heartbeats.
pub struct DatanodeHandler {
    state: Arc<Mutex<NamenodeState>>,
}

impl DatanodeHandler {
    pub fn new(namenode_state: Arc<Mutex<NamenodeState>>) -> Self {
        Self {
            state: namenode_state,
        }
    }

    /// Idempotent: re-registering refreshes the address and capacity and
    /// resets liveness.
    #[instrument(name = "datanode_register", skip(self))]
    pub async fn register_datanode(
        &self,
        node_id: String,
        host: String,
        port: u16,
        total_space: u64,
    ) -> Reply<Ack> {
        let mut state = self.state.lock().await;
        match state.datanodes.get_mut(&node_id) {
            Some(datanode_details) => {
                datanode_details.register(host, port, total_space);
                info!(%node_id, "Datanode re-registered");
            }
            None => {
                info!(%node_id, %host, %port, "Datanode registered");
                state.datanodes.insert(
                    node_id.clone(),
                    DatanodeDetail::new(node_id, host, port, total_space),
                );
            }
        }
        Reply::ok(Ack {})
    }

    /// A heartbeat from an unknown node id is accepted and creates a
    /// minimal descriptor; the node stays out of placement until it
    /// re-registers with an address.
    #[instrument(name = "datanode_heartbeat", skip(self, chunks))]
    pub async fn heartbeat(
        &self,
        node_id: String,
        available_space: u64,
        total_space: u64,
        chunks: Vec<String>,
    ) -> Reply<Ack> {
        let mut state = self.state.lock().await;
        let datanode_details = state
            .datanodes
            .entry(node_id.clone())
            .or_insert_with(|| DatanodeDetail::placeholder(node_id));
        datanode_details.apply_heartbeat(available_space, total_space, chunks);
        Reply::ok(Ack {})
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn heartbeat_from_unknown_node_creates_a_descriptor() {
        let state = Arc::new(Mutex::new(NamenodeState::new()));
        let handler = DatanodeHandler::new(state.clone());
        handler
            .heartbeat("dn_ghost".to_owned(), 10, 100, vec!["chunk_a_0".to_owned()])
            .await
            .into_result()
            .unwrap();
        let state = state.lock().await;
        let detail = state.datanodes.get("dn_ghost").unwrap();
        assert!(detail.is_alive(Duration::from_secs(30)));
        assert!(!detail.has_addr());
        assert_eq!(detail.available_space, 10);
    }

    #[tokio::test]
    async fn reregistration_is_idempotent() {
        let state = Arc::new(Mutex::new(NamenodeState::new()));
        let handler = DatanodeHandler::new(state.clone());
        for _ in 0..2 {
            handler
                .register_datanode("dn_1".to_owned(), "127.0.0.1".to_owned(), 9001, 100)
                .await
                .into_result()
                .unwrap();
        }
        assert_eq!(state.lock().await.datanodes.len(), 1);
    }
}
