use std::sync::Arc;

use tracing::{debug, info};

use crate::application::TaskExampleStorage;
use crate::domain::{StorageError, StoredId, TaskExample};

pub struct StoreTaskExampleUseCase {
    storage: Arc<dyn TaskExampleStorage>,
}

impl StoreTaskExampleUseCase {
    pub fn new(storage: Arc<dyn TaskExampleStorage>) -> Self {
        Self { storage }
    }

    pub async fn execute(&self, example: TaskExample) -> Result<StoredId, StorageError> {
        if example.task().trim().is_empty() {
            return Err(StorageError::invalid_input("Task description must not be empty"));
        }

        debug!("Storing task example with {} tags", example.tags().len());
        let id = self.storage.store(&example).await?;
        info!("Stored task example {}", id);

        Ok(id)
    }
}
