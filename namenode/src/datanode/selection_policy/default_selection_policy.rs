use super::selection_policy::DatanodeSelectionPolicy;
use crate::namenode_state::NamenodeState;
use async_trait::async_trait;
use proto::messages::{DatanodeMeta, RemoteError};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use utilities::logger::{instrument, tracing};

/// Deterministic load-spreading placement: live, addressable datanodes are
/// ordered by (available_space desc, node_id asc) and the list is rotated
/// by chunk index so primary responsibility cycles across a file.
pub struct DefaultDatanodeSelectionPolicy {
    namenode_state: Arc<Mutex<NamenodeState>>,
    replication: u32,
    liveness_timeout: Duration,
}

impl DefaultDatanodeSelectionPolicy {
    pub fn new(
        namenode_state: Arc<Mutex<NamenodeState>>,
        replication: u32,
        liveness_timeout: Duration,
    ) -> Self {
        Self {
            namenode_state,
            replication,
            liveness_timeout,
        }
    }
}

#[async_trait]
impl DatanodeSelectionPolicy for DefaultDatanodeSelectionPolicy {
    #[instrument(name = "policy_datanode_selection", skip(self))]
    async fn select_replicas(&self, chunk_index: u64) -> Result<Vec<DatanodeMeta>, RemoteError> {
        let namenode_state = self.namenode_state.lock().await;
        let mut candidates: Vec<_> = namenode_state
            .datanodes
            .values()
            .filter(|datanode| datanode.is_alive(self.liveness_timeout) && datanode.has_addr())
            .map(|datanode| (datanode.available_space, datanode.meta()))
            .collect();
        drop(namenode_state);

        if candidates.len() < self.replication as usize {
            return Err(RemoteError::insufficient_capacity(format!(
                "Insufficient datanodes. Need {}, found {}",
                self.replication,
                candidates.len()
            )));
        }
        candidates.sort_by(|(space_a, meta_a), (space_b, meta_b)| {
            space_b
                .cmp(space_a)
                .then_with(|| meta_a.node_id.cmp(&meta_b.node_id))
        });
        let rotation = (chunk_index as usize) % candidates.len();
        candidates.rotate_left(rotation);
        Ok(candidates
            .into_iter()
            .take(self.replication as usize)
            .map(|(_, meta)| meta)
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::namenode_state::datanode_details::DatanodeDetail;
    use proto::messages::ErrorKind;

    const MIB: u64 = 1024 * 1024;

    fn state_with_capacities(capacities_mib: &[(&str, u64)]) -> Arc<Mutex<NamenodeState>> {
        let mut state = NamenodeState::new();
        for (node_id, capacity) in capacities_mib {
            let mut detail = DatanodeDetail::new(
                node_id.to_string(),
                "127.0.0.1".to_owned(),
                9000,
                capacity * MIB,
            );
            detail.apply_heartbeat(capacity * MIB, capacity * MIB, vec![]);
            state.datanodes.insert(node_id.to_string(), detail);
        }
        Arc::new(Mutex::new(state))
    }

    #[tokio::test]
    async fn picks_highest_free_space_first() {
        let state = state_with_capacities(&[
            ("dn_1", 100),
            ("dn_2", 80),
            ("dn_3", 60),
            ("dn_4", 40),
        ]);
        let policy = DefaultDatanodeSelectionPolicy::new(state, 3, Duration::from_secs(30));
        let replicas = policy.select_replicas(0).await.unwrap();
        let ids: Vec<_> = replicas.iter().map(|m| m.node_id.as_str()).collect();
        assert_eq!(ids, ["dn_1", "dn_2", "dn_3"]);
    }

    #[tokio::test]
    async fn ties_break_on_node_id() {
        let state = state_with_capacities(&[("dn_b", 50), ("dn_a", 50), ("dn_c", 50)]);
        let policy = DefaultDatanodeSelectionPolicy::new(state, 2, Duration::from_secs(30));
        let replicas = policy.select_replicas(0).await.unwrap();
        let ids: Vec<_> = replicas.iter().map(|m| m.node_id.as_str()).collect();
        assert_eq!(ids, ["dn_a", "dn_b"]);
    }

    #[tokio::test]
    async fn rotation_cycles_primary_across_chunks() {
        let state = state_with_capacities(&[("dn_1", 100), ("dn_2", 80), ("dn_3", 60)]);
        let policy = DefaultDatanodeSelectionPolicy::new(state, 2, Duration::from_secs(30));
        let chunk0 = policy.select_replicas(0).await.unwrap();
        let chunk1 = policy.select_replicas(1).await.unwrap();
        assert_eq!(chunk0[0].node_id, "dn_1");
        assert_eq!(chunk1[0].node_id, "dn_2");
        // every selection still holds R distinct nodes
        assert_ne!(chunk1[0].node_id, chunk1[1].node_id);
    }

    #[tokio::test]
    async fn fewer_live_nodes_than_replication_is_insufficient_capacity() {
        let state = state_with_capacities(&[("dn_1", 100), ("dn_2", 80)]);
        let policy = DefaultDatanodeSelectionPolicy::new(state, 3, Duration::from_secs(30));
        let err = policy.select_replicas(0).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientCapacity);
    }

    #[tokio::test(start_paused = true)]
    async fn dead_nodes_are_never_selected() {
        let state = state_with_capacities(&[("dn_1", 100), ("dn_2", 80), ("dn_3", 60)]);
        tokio::time::advance(Duration::from_secs(31)).await;
        if let Some(detail) = state.lock().await.datanodes.get_mut("dn_2") {
            detail.mark_heartbeat();
        }
        let policy = DefaultDatanodeSelectionPolicy::new(state, 1, Duration::from_secs(30));
        let replicas = policy.select_replicas(0).await.unwrap();
        assert_eq!(replicas[0].node_id, "dn_2");
    }
}
