use std::collections::HashSet;
use std::{sync::Arc, time::Duration};

use tokio::{sync::Mutex, time::interval};
use utilities::logger::{Level, span, warn};

use crate::namenode_state::NamenodeState;

/// Periodic housekeeper: strips long-dead datanodes out of the in-memory
/// placement sets and surfaces degraded files in the logs. Liveness itself
/// is a derived predicate, so this is an optimization, not a correctness
/// requirement.
pub struct StateMaintainer {
    namenode_state: Arc<Mutex<NamenodeState>>,
    liveness_timeout: Duration,
    sweep_interval: Duration,
}

impl StateMaintainer {
    pub fn new(
        namenode_state: Arc<Mutex<NamenodeState>>,
        liveness_timeout: Duration,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            namenode_state,
            liveness_timeout,
            sweep_interval,
        }
    }

    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.sweep_interval);
            loop {
                ticker.tick().await;
                let span = span!(Level::INFO, "namenode_state_sweep");
                let _entered = span.enter();
                let mut state = self.namenode_state.lock().await;

                let dead_datanodes: HashSet<String> = state
                    .datanodes
                    .values()
                    .filter(|datanode| !datanode.is_alive(self.liveness_timeout))
                    .map(|datanode| datanode.id.clone())
                    .collect();
                if dead_datanodes.is_empty() {
                    continue;
                }
                for record in state.files.values_mut() {
                    let lost = record.strip_locations(&dead_datanodes);
                    if lost > 0 {
                        warn!(
                            filename = %record.filename,
                            lost_chunks = %lost,
                            "File is degraded: chunks without any live replica"
                        );
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::namenode_state::datanode_details::DatanodeDetail;
    use crate::namenode_state::file_record::FileRecord;
    use proto::messages::ChunkCommit;

    #[tokio::test(start_paused = true)]
    async fn sweep_strips_dead_nodes_from_placements() {
        let mut state = NamenodeState::new();
        state.datanodes.insert(
            "dn_1".to_owned(),
            DatanodeDetail::new("dn_1".to_owned(), "127.0.0.1".to_owned(), 9001, 100),
        );
        state.datanodes.insert(
            "dn_2".to_owned(),
            DatanodeDetail::new("dn_2".to_owned(), "127.0.0.1".to_owned(), 9002, 100),
        );
        state.files.insert(
            "a.bin".to_owned(),
            FileRecord::new(
                "a.bin".to_owned(),
                1024,
                1024,
                2,
                vec![ChunkCommit {
                    chunk_id: "chunk_a.bin_0".to_owned(),
                    chunk_index: 0,
                    locations: vec!["dn_1".to_owned(), "dn_2".to_owned()],
                }],
            ),
        );
        let state = Arc::new(Mutex::new(state));

        // dn_2 keeps heartbeating, dn_1 goes silent
        tokio::time::advance(Duration::from_millis(400)).await;
        state
            .lock()
            .await
            .datanodes
            .get_mut("dn_2")
            .unwrap()
            .mark_heartbeat();

        let maintainer = StateMaintainer::new(
            state.clone(),
            Duration::from_millis(300),
            Duration::from_millis(100),
        );
        let handle = maintainer.start();
        // paused clock: sleeping drives the sweeper's timer forward
        tokio::time::sleep(Duration::from_millis(150)).await;

        let replicas = state.lock().await.files["a.bin"].chunks[0].replicas.clone();
        assert_eq!(replicas, vec!["dn_2".to_owned()]);
        handle.abort();
    }
}
