use async_trait::async_trait;

use crate::domain::{ScoredExample, StorageError, StoredId, TaskExample};

/// The storage capability every backend honours identically.
///
/// Implementations must be safe to share across concurrent tasks without
/// external locking.
#[async_trait]
pub trait TaskExampleStorage: Send + Sync {
    async fn store(&self, example: &TaskExample) -> Result<StoredId, StorageError>;

    /// Return at most `limit` examples ordered by descending relevance to
    /// `query`. Scores are only comparable within one adapter instance.
    async fn find_relevant(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredExample>, StorageError>;

    async fn count(&self) -> Result<u64, StorageError>;
}
