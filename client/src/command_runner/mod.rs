mod delete_file_handler;
mod fetch_file_handler;
mod store_file_handler;

use delete_file_handler::DeleteFileHandler;
use fetch_file_handler::FetchFileHandler;
use proto::messages::{ClusterSummary, FileDetails, FileList};
use store_file_handler::StoreFileHandler;
use utilities::result::Result;

use crate::datanode_service::DatanodeService;
use crate::namenode_service::NamenodeService;

/// Stateless entry points for the file-level operations; every call
/// reacquires its plan from the namenode.
pub struct CommandRunner {
    namenode: NamenodeService,
    store_file_handler: StoreFileHandler,
    fetch_file_handler: FetchFileHandler,
    delete_file_handler: DeleteFileHandler,
}

impl CommandRunner {
    pub fn new(namenode: NamenodeService) -> Self {
        CommandRunner {
            store_file_handler: StoreFileHandler::new(namenode.clone(), DatanodeService::new()),
            fetch_file_handler: FetchFileHandler::new(namenode.clone(), DatanodeService::new()),
            delete_file_handler: DeleteFileHandler::new(namenode.clone()),
            namenode,
        }
    }

    pub async fn upload(&self, local_path: String, remote_file_name: String) -> Result<String> {
        self.store_file_handler
            .store_file(local_path, remote_file_name)
            .await
    }

    pub async fn download(&self, remote_file_name: String, local_path: String) -> Result<String> {
        self.fetch_file_handler
            .fetch_file(remote_file_name, local_path)
            .await
    }

    pub async fn delete(&self, remote_file_name: String) -> Result<String> {
        self.delete_file_handler.delete_file(remote_file_name).await
    }

    pub async fn list(&self) -> Result<FileList> {
        self.namenode.list_files().await
    }

    pub async fn info(&self, remote_file_name: &str) -> Result<FileDetails> {
        self.namenode.file_info(remote_file_name).await
    }

    pub async fn status(&self) -> Result<ClusterSummary> {
        self.namenode.cluster_status().await
    }
}
