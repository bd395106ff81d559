pub mod datanode_details;
pub mod file_record;

use std::collections::HashMap;
use std::time::Duration;

use datanode_details::DatanodeDetail;
use file_record::FileRecord;

/// The whole namespace and liveness view, guarded by one mutex at the
/// server level. The namenode never stores file bytes.
#[derive(Default, Debug, Clone)]
pub struct NamenodeState {
    pub files: HashMap<String, FileRecord>,
    pub datanodes: HashMap<String, DatanodeDetail>,
}

impl NamenodeState {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn alive_datanode_count(&self, liveness_timeout: Duration) -> usize {
        self.datanodes
            .values()
            .filter(|d| d.is_alive(liveness_timeout))
            .count()
    }
}
