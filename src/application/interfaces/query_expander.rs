use async_trait::async_trait;

use crate::domain::StorageError;

/// Expands a natural language query into alternative phrasings to improve
/// recall of stored task examples.
#[async_trait]
pub trait QueryExpander: Send + Sync {
    /// Expand a query into multiple variants.
    ///
    /// The original query is always included as the first element.
    async fn expand(&self, query: &str) -> Result<Vec<String>, StorageError>;
}
