use utilities::{
    logger::{instrument, tracing},
    result::Result,
};

use crate::namenode_service::NamenodeService;

pub struct DeleteFileHandler {
    namenode: NamenodeService,
}

impl DeleteFileHandler {
    pub fn new(namenode: NamenodeService) -> Self {
        Self { namenode }
    }

    #[instrument(skip(self))]
    pub async fn delete_file(&self, remote_file_name: String) -> Result<String> {
        self.namenode.delete_file(&remote_file_name).await?;
        Ok(format!("File {remote_file_name} deleted"))
    }
}
