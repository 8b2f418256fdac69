use super::EnvSnapshot;

pub const DEFAULT_CHROMA_URL: &str = "https://api.trychroma.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-haiku-4-5";
pub const DEFAULT_COLLECTION: &str = "task_examples";

/// Optional endpoint overrides for the external providers.
///
/// These never take part in choosing a backend. Unset or empty values fall
/// back to the hosted defaults.
///
/// | Variable                 | Default                     |
/// |--------------------------|-----------------------------|
/// | `CHROMA_URL`             | `https://api.trychroma.com` |
/// | `TASK_RECALL_COLLECTION` | `task_examples`             |
/// | `OPENAI_BASE_URL`        | `https://api.openai.com`    |
/// | `OPENAI_EMBEDDING_MODEL` | `text-embedding-3-small`    |
/// | `ANTHROPIC_BASE_URL`     | `https://api.anthropic.com` |
/// | `ANTHROPIC_MODEL`        | `claude-haiku-4-5`          |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub chroma_url: String,
    pub collection: String,
    pub openai_base_url: String,
    pub embedding_model: String,
    pub anthropic_base_url: String,
    pub anthropic_model: String,
}

impl ProviderEndpoints {
    pub fn from_snapshot(snapshot: &EnvSnapshot) -> Self {
        let or_default = |key: &str, default: &str| {
            snapshot.get_non_empty(key).unwrap_or(default).to_string()
        };

        Self {
            chroma_url: or_default("CHROMA_URL", DEFAULT_CHROMA_URL),
            collection: or_default("TASK_RECALL_COLLECTION", DEFAULT_COLLECTION),
            openai_base_url: or_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            embedding_model: or_default("OPENAI_EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            anthropic_base_url: or_default("ANTHROPIC_BASE_URL", DEFAULT_ANTHROPIC_BASE_URL),
            anthropic_model: or_default("ANTHROPIC_MODEL", DEFAULT_ANTHROPIC_MODEL),
        }
    }
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self::from_snapshot(&EnvSnapshot::default())
    }
}
