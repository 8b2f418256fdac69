use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::EmbeddingService;
use crate::domain::StorageError;

const EMBEDDINGS_PATH: &str = "/v1/embeddings";

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// HTTP client for the OpenAI embeddings API.
///
/// Failures are reported as [`StorageError::QueryFailed`]; callers on the
/// write path remap them to [`StorageError::WriteFailed`].
pub struct OpenAiEmbedding {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiEmbedding {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let base: String = base_url.into();
        let url = format!("{}{}", base.trim_end_matches('/'), EMBEDDINGS_PATH);
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StorageError::unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            url,
        })
    }

    fn order_by_index(
        mut data: Vec<EmbeddingData>,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>, StorageError> {
        if data.len() != expected {
            return Err(StorageError::query(format!(
                "Embedding API returned {} vectors for {} inputs",
                data.len(),
                expected
            )));
        }
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingService for OpenAiEmbedding {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, StorageError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| StorageError::query(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Embedding API returned {status}: {body}");
            return Err(StorageError::query(format!(
                "Embedding API returned {status}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| StorageError::query(format!("Failed to parse embedding response: {}", e)))?;

        debug!("Generated {} embeddings with {}", parsed.data.len(), self.model);
        Self::order_by_index(parsed.data, texts.len())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_by_index_restores_input_order() {
        let data = vec![
            EmbeddingData {
                index: 1,
                embedding: vec![1.0],
            },
            EmbeddingData {
                index: 0,
                embedding: vec![0.0],
            },
        ];

        let ordered = OpenAiEmbedding::order_by_index(data, 2).unwrap();
        assert_eq!(ordered, vec![vec![0.0], vec![1.0]]);
    }

    #[test]
    fn test_order_by_index_rejects_count_mismatch() {
        let err = OpenAiEmbedding::order_by_index(Vec::new(), 1).unwrap_err();
        assert!(err.is_query_failed());
    }

    #[test]
    fn test_url_joins_base_without_double_slash() {
        let service = OpenAiEmbedding::new("key", "text-embedding-3-small", "http://localhost:1234/")
            .unwrap();
        assert_eq!(service.url, "http://localhost:1234/v1/embeddings");
        assert_eq!(service.model_name(), "text-embedding-3-small");
    }
}
