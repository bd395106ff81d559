use std::time::Duration;

use storage::{file_storage::FileStorage, storage::Storage};
use tokio::time::interval;
use utilities::logger::{Level, error, span, trace};

use crate::namenode_service::NamenodeService;

/// The heartbeat loop: every interval it enumerates the local container,
/// measures usage, and reports both to the namenode. A failed heartbeat is
/// logged and retried on the next tick; it never tears the datanode down.
pub struct StateMaintainer {
    store: FileStorage,
    namenode_service: NamenodeService,
    heartbeat_interval: Duration,
}

impl StateMaintainer {
    pub fn new(
        store: FileStorage,
        namenode_service: NamenodeService,
        heartbeat_interval: Duration,
    ) -> Self {
        Self {
            store,
            namenode_service,
            heartbeat_interval,
        }
    }

    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.heartbeat_interval);
            loop {
                ticker.tick().await;
                let span = span!(Level::INFO, "datanode_heartbeat_tick");
                let _entered = span.enter();
                let available_chunks = match self.store.available_chunks().await {
                    Ok(v) => v,
                    Err(e) => {
                        error!(
                            "Skipping heartbeat: error while enumerating the chunk container {e}"
                        );
                        continue;
                    }
                };
                let usage = match self.store.usage().await {
                    Ok(v) => v,
                    Err(e) => {
                        error!("Skipping heartbeat: error while measuring storage usage {e}");
                        continue;
                    }
                };
                match self
                    .namenode_service
                    .send_heartbeat(usage.available, usage.total, available_chunks)
                    .await
                {
                    Ok(()) => {
                        trace!("Heartbeat sent");
                    }
                    Err(e) => {
                        error!("Error while sending heartbeat, retrying on the next tick {e}");
                    }
                }
            }
        })
    }
}
