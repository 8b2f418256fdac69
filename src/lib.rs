pub mod application;
pub mod connector;
pub mod domain;

pub use application::{
    EmbeddingService, FindRelevantExamplesUseCase, QueryExpander, StoreTaskExampleUseCase,
    TaskExampleStorage,
};

pub use connector::{
    resolve, ChromaSettings, ChromaTaskExampleStore, EnvSnapshot, LlmQueryExpander,
    OpenAiEmbedding, ProviderEndpoints, SqliteTaskExampleStore, StorageFactory,
};

pub use domain::{
    BackendConfig, BackendTag, ConfigurationError, FieldViolation, RelationalBackendConfig,
    Requirement, ResolvedConfig, ScoredExample, StartupError, StorageError, StoredId,
    TaskExample, VectorBackendConfig,
};
