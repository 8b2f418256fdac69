use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::application::TaskExampleStorage;
use crate::domain::{ScoredExample, StorageError};

pub struct FindRelevantExamplesUseCase {
    storage: Arc<dyn TaskExampleStorage>,
    min_score: Option<f32>,
}

impl FindRelevantExamplesUseCase {
    pub fn new(storage: Arc<dyn TaskExampleStorage>) -> Self {
        Self {
            storage,
            min_score: None,
        }
    }

    pub fn with_min_score(mut self, score: f32) -> Self {
        self.min_score = Some(score);
        self
    }

    pub async fn execute(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredExample>, StorageError> {
        if query.trim().is_empty() {
            return Err(StorageError::invalid_input("Query must not be empty"));
        }

        let start_time = Instant::now();
        let mut results = self.storage.find_relevant(query, limit).await?;

        if let Some(min_score) = self.min_score {
            results.retain(|r| r.score() >= min_score);
        }

        info!(
            "Found {} relevant examples in {:?}",
            results.len(),
            start_time.elapsed()
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::SqliteTaskExampleStore;
    use crate::domain::TaskExample;

    async fn seeded_storage() -> Arc<SqliteTaskExampleStore> {
        let storage = Arc::new(SqliteTaskExampleStore::in_memory().await.unwrap());
        storage
            .store(&TaskExample::new("Parse JSON config file", "Use serde_json::from_str"))
            .await
            .unwrap();
        storage
            .store(&TaskExample::new("Write a JSON config", "Deploy with docker and config"))
            .await
            .unwrap();
        storage
    }

    #[tokio::test]
    async fn test_min_score_filters_weak_matches() {
        let storage = seeded_storage().await;
        let use_case = FindRelevantExamplesUseCase::new(storage).with_min_score(0.9);

        let results = use_case.execute("parse json config", 5).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].example().task(), "Parse JSON config file");
    }

    #[tokio::test]
    async fn test_rejects_empty_query() {
        let storage = seeded_storage().await;
        let use_case = FindRelevantExamplesUseCase::new(storage);

        assert!(use_case.execute("  ", 5).await.is_err());
    }
}
