use async_trait::async_trait;

use crate::domain::StorageError;

/// Generates vector embeddings for documents and queries.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, StorageError>;

    fn model_name(&self) -> &str;
}
