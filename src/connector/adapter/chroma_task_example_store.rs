use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::application::{EmbeddingService, QueryExpander, TaskExampleStorage};
use crate::domain::{rank_by_score, ScoredExample, StorageError, StoredId, TaskExample};

const CHROMA_TOKEN_HEADER: &str = "x-chroma-token";

/// Where and as whom to reach the Chroma server.
#[derive(Clone)]
pub struct ChromaSettings {
    pub url: String,
    pub api_key: String,
    pub tenant: String,
    pub database: String,
    pub collection: String,
}

#[derive(Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    get_or_create: bool,
}

#[derive(Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Serialize)]
struct AddRequest<'a> {
    ids: Vec<&'a str>,
    embeddings: Vec<Vec<f32>>,
    documents: Vec<String>,
    metadatas: Vec<Map<String, Value>>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query_embeddings: Vec<Vec<f32>>,
    n_results: usize,
    include: [&'a str; 2],
}

#[derive(Deserialize, Default)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Map<String, Value>>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
}

/// Chroma-backed task example store with OpenAI embeddings.
///
/// Talks to the Chroma HTTP API scoped to one tenant and database. The
/// collection is resolved (and created if missing) during [`connect`], so an
/// unreachable server or bad credentials fail at startup.
///
/// [`connect`]: ChromaTaskExampleStore::connect
pub struct ChromaTaskExampleStore {
    client: reqwest::Client,
    api_key: String,
    collection_url: String,
    embedding_service: Arc<dyn EmbeddingService>,
    query_expander: Option<Arc<dyn QueryExpander>>,
}

impl ChromaTaskExampleStore {
    pub async fn connect(
        settings: ChromaSettings,
        embedding_service: Arc<dyn EmbeddingService>,
    ) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StorageError::unavailable(format!("Failed to build HTTP client: {}", e)))?;

        let base = settings.url.trim_end_matches('/');

        client
            .get(format!("{}/api/v2/heartbeat", base))
            .header(CHROMA_TOKEN_HEADER, &settings.api_key)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                StorageError::unavailable(format!("Failed to connect to ChromaDB at {}: {}", base, e))
            })?;

        let collections_url = format!(
            "{}/api/v2/tenants/{}/databases/{}/collections",
            base, settings.tenant, settings.database
        );

        let collection: CollectionResponse = client
            .post(&collections_url)
            .header(CHROMA_TOKEN_HEADER, &settings.api_key)
            .json(&CreateCollectionRequest {
                name: &settings.collection,
                get_or_create: true,
            })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| StorageError::unavailable(format!("Failed to get/create collection: {}", e)))?
            .json()
            .await
            .map_err(|e| {
                StorageError::unavailable(format!("Failed to parse collection response: {}", e))
            })?;

        debug!("Using ChromaDB collection: {}", settings.collection);
        debug!(
            "Connected to ChromaDB at {} (tenant {}, database {})",
            base, settings.tenant, settings.database
        );

        Ok(Self {
            client,
            api_key: settings.api_key,
            collection_url: format!("{}/{}", collections_url, collection.id),
            embedding_service,
            query_expander: None,
        })
    }

    pub fn with_query_expander(mut self, expander: Arc<dyn QueryExpander>) -> Self {
        self.query_expander = Some(expander);
        self
    }

    fn create_metadata(example: &TaskExample) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("task".to_string(), Value::String(example.task().to_string()));
        map.insert(
            "solution".to_string(),
            Value::String(example.solution().to_string()),
        );
        // Chroma metadata values are scalars, so tags travel as a JSON string.
        map.insert(
            "tags".to_string(),
            Value::String(Value::from(example.tags().to_vec()).to_string()),
        );
        map
    }

    fn example_from_metadata(metadata: &Map<String, Value>) -> Result<TaskExample, StorageError> {
        let task = metadata
            .get("task")
            .and_then(|v| v.as_str())
            .ok_or_else(|| StorageError::query("Missing task metadata"))?;
        let solution = metadata
            .get("solution")
            .and_then(|v| v.as_str())
            .ok_or_else(|| StorageError::query("Missing solution metadata"))?;
        let tags = match metadata.get("tags").and_then(|v| v.as_str()) {
            Some(raw) => serde_json::from_str::<Vec<String>>(raw)
                .map_err(|e| StorageError::query(format!("Corrupt tags metadata: {}", e)))?,
            None => Vec::new(),
        };

        Ok(TaskExample::new(task, solution).with_tags(tags))
    }

    async fn query_variants(&self, query: &str) -> Vec<String> {
        match self.query_expander {
            Some(ref expander) => match expander.expand(query).await {
                Ok(variants) if !variants.is_empty() => variants,
                Ok(_) => vec![query.to_string()],
                Err(e) => {
                    warn!("Query expansion failed: {}. Using original query.", e);
                    vec![query.to_string()]
                }
            },
            None => vec![query.to_string()],
        }
    }

    async fn query_collection(
        &self,
        query_embeddings: Vec<Vec<f32>>,
        n_results: usize,
    ) -> Result<QueryResponse, StorageError> {
        let response = self
            .client
            .post(format!("{}/query", self.collection_url))
            .header(CHROMA_TOKEN_HEADER, &self.api_key)
            .json(&QueryRequest {
                query_embeddings,
                n_results,
                include: ["metadatas", "distances"],
            })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| StorageError::query(format!("Failed to search embeddings: {}", e)))?;

        response
            .json()
            .await
            .map_err(|e| StorageError::query(format!("Failed to parse query response: {}", e)))
    }
}

/// Chroma returns distances; map them onto a similarity in `(0, 1]`.
fn distance_to_score(distance: f32) -> f32 {
    1.0 / (1.0 + distance.max(0.0))
}

/// Flatten per-embedding result lists, keeping the best score for each id.
fn merge_query_results(response: QueryResponse) -> Result<Vec<ScoredExample>, StorageError> {
    let metadatas = response.metadatas.unwrap_or_default();
    let distances = response.distances.unwrap_or_default();

    let mut best: HashMap<String, ScoredExample> = HashMap::new();

    for (row, ids) in response.ids.into_iter().enumerate() {
        let row_metadatas = metadatas.get(row);
        let row_distances = distances.get(row);

        for (col, id) in ids.into_iter().enumerate() {
            let metadata = match row_metadatas.and_then(|m| m.get(col)).and_then(|m| m.as_ref()) {
                Some(metadata) => metadata,
                None => continue,
            };
            let distance = match row_distances.and_then(|d| d.get(col)).copied().flatten() {
                Some(distance) => distance,
                None => continue,
            };

            let score = distance_to_score(distance);
            if best.get(&id).is_some_and(|existing| existing.score() >= score) {
                continue;
            }

            let example = ChromaTaskExampleStore::example_from_metadata(metadata)?;
            best.insert(
                id.clone(),
                ScoredExample::new(StoredId::from_string(id), example, score),
            );
        }
    }

    Ok(best.into_values().collect())
}

fn into_write_error(err: StorageError) -> StorageError {
    match err {
        StorageError::QueryFailed(msg) => StorageError::WriteFailed(msg),
        other => other,
    }
}

#[async_trait]
impl TaskExampleStorage for ChromaTaskExampleStore {
    async fn store(&self, example: &TaskExample) -> Result<StoredId, StorageError> {
        let id = StoredId::generate();
        let document = example.document();

        let embedding = self
            .embedding_service
            .embed(std::slice::from_ref(&document))
            .await
            .map_err(into_write_error)?
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::write("Embedding service returned no vector"))?;

        let request = AddRequest {
            ids: vec![id.as_str()],
            embeddings: vec![embedding],
            documents: vec![document],
            metadatas: vec![Self::create_metadata(example)],
        };

        self.client
            .post(format!("{}/add", self.collection_url))
            .header(CHROMA_TOKEN_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| StorageError::write(format!("Failed to save task example: {}", e)))?;

        debug!("Saved task example {} to ChromaDB", id);
        Ok(id)
    }

    async fn find_relevant(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredExample>, StorageError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let variants = self.query_variants(query).await;
        let embeddings = self.embedding_service.embed(&variants).await?;
        debug!(
            "Querying ChromaDB with {} query variants via {}",
            embeddings.len(),
            self.embedding_service.model_name()
        );

        let response = self.query_collection(embeddings, limit).await?;
        let merged = merge_query_results(response)?;

        Ok(rank_by_score(merged, limit))
    }

    async fn count(&self) -> Result<u64, StorageError> {
        self.client
            .get(format!("{}/count", self.collection_url))
            .header(CHROMA_TOKEN_HEADER, &self.api_key)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| StorageError::query(format!("Failed to count task examples: {}", e)))?
            .json::<u64>()
            .await
            .map_err(|e| StorageError::query(format!("Failed to parse count response: {}", e)))
    }
}
