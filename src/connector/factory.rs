use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::{QueryExpander, TaskExampleStorage};
use crate::connector::config::{resolve, EnvSnapshot, ProviderEndpoints};
use crate::connector::{
    ChromaSettings, ChromaTaskExampleStore, LlmQueryExpander, OpenAiEmbedding,
    SqliteTaskExampleStore,
};
use crate::domain::{
    BackendConfig, RelationalBackendConfig, StartupError, StorageError, VectorBackendConfig,
};

/// Builds the process-wide task example storage handle.
///
/// Selection is decided once from an [`EnvSnapshot`]; the returned handle
/// hides which backend is live. Building twice yields two independent
/// handles.
pub struct StorageFactory;

impl StorageFactory {
    /// Capture the process environment and build from it.
    pub async fn build_from_env() -> Result<Arc<dyn TaskExampleStorage>, StartupError> {
        Self::build(&EnvSnapshot::capture()).await
    }

    pub async fn build(
        snapshot: &EnvSnapshot,
    ) -> Result<Arc<dyn TaskExampleStorage>, StartupError> {
        let resolved = resolve(snapshot)?;
        info!("{}", resolved.tag().diagnostic_line());

        let endpoints = ProviderEndpoints::from_snapshot(snapshot);
        let storage = Self::connect(resolved.into_config(), &endpoints).await?;
        Ok(storage)
    }

    async fn connect(
        config: BackendConfig,
        endpoints: &ProviderEndpoints,
    ) -> Result<Arc<dyn TaskExampleStorage>, StorageError> {
        match config {
            BackendConfig::Vector(config) => Self::connect_vector(config, endpoints).await,
            BackendConfig::Relational(config) => {
                Self::connect_relational(config, endpoints).await
            }
        }
    }

    async fn connect_vector(
        config: VectorBackendConfig,
        endpoints: &ProviderEndpoints,
    ) -> Result<Arc<dyn TaskExampleStorage>, StorageError> {
        let embedding = Arc::new(OpenAiEmbedding::new(
            config.openai_api_key,
            endpoints.embedding_model.as_str(),
            endpoints.openai_base_url.as_str(),
        )?);
        let expander = Self::query_expander(&config.anthropic_api_key, endpoints)?;

        let settings = ChromaSettings {
            url: endpoints.chroma_url.clone(),
            api_key: config.chroma_api_key,
            tenant: config.chroma_tenant,
            database: config.chroma_database,
            collection: endpoints.collection.clone(),
        };

        let store = ChromaTaskExampleStore::connect(settings, embedding)
            .await?
            .with_query_expander(expander);
        Ok(Arc::new(store))
    }

    async fn connect_relational(
        config: RelationalBackendConfig,
        endpoints: &ProviderEndpoints,
    ) -> Result<Arc<dyn TaskExampleStorage>, StorageError> {
        let expander = Self::query_expander(&config.anthropic_api_key, endpoints)?;

        let store = SqliteTaskExampleStore::new(Path::new(&config.sqlite_path))
            .await?
            .with_query_expander(expander);
        Ok(Arc::new(store))
    }

    fn query_expander(
        api_key: &str,
        endpoints: &ProviderEndpoints,
    ) -> Result<Arc<dyn QueryExpander>, StorageError> {
        debug!(
            "Query expansion via {} at {}",
            endpoints.anthropic_model, endpoints.anthropic_base_url
        );
        Ok(Arc::new(LlmQueryExpander::new(
            api_key,
            endpoints.anthropic_model.as_str(),
            endpoints.anthropic_base_url.as_str(),
        )?))
    }
}
