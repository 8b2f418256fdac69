use std::fmt;

/// Settings for the Chroma-backed vector store.
#[derive(Clone, PartialEq, Eq)]
pub struct VectorBackendConfig {
    pub chroma_api_key: String,
    pub chroma_tenant: String,
    pub chroma_database: String,
    pub openai_api_key: String,
    pub anthropic_api_key: String,
}

/// Settings for the SQLite-backed relational store.
#[derive(Clone, PartialEq, Eq)]
pub struct RelationalBackendConfig {
    pub sqlite_path: String,
    pub anthropic_api_key: String,
}

// Credentials never reach logs through Debug.
impl fmt::Debug for VectorBackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorBackendConfig")
            .field("chroma_api_key", &"<redacted>")
            .field("chroma_tenant", &self.chroma_tenant)
            .field("chroma_database", &self.chroma_database)
            .field("openai_api_key", &"<redacted>")
            .field("anthropic_api_key", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for RelationalBackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationalBackendConfig")
            .field("sqlite_path", &self.sqlite_path)
            .field("anthropic_api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Vector(VectorBackendConfig),
    Relational(RelationalBackendConfig),
}

impl BackendConfig {
    pub fn tag(&self) -> BackendTag {
        match self {
            Self::Vector(_) => BackendTag::Vector,
            Self::Relational(_) => BackendTag::Relational,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendTag {
    Vector,
    Relational,
}

impl BackendTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Relational => "relational",
        }
    }

    /// Name of the concrete store behind the tag.
    pub fn store_name(&self) -> &'static str {
        match self {
            Self::Vector => "chroma",
            Self::Relational => "sqlite",
        }
    }

    pub fn diagnostic_line(&self) -> String {
        format!("Using {} storage with Anthropic AI", self.store_name())
    }
}

impl fmt::Display for BackendTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated configuration together with the backend it selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    config: BackendConfig,
    tag: BackendTag,
}

impl ResolvedConfig {
    pub fn new(config: BackendConfig) -> Self {
        let tag = config.tag();
        Self { config, tag }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn tag(&self) -> BackendTag {
        self.tag
    }

    pub fn into_config(self) -> BackendConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_credentials() {
        let config = BackendConfig::Vector(VectorBackendConfig {
            chroma_api_key: "ck-secret".to_string(),
            chroma_tenant: "tenant".to_string(),
            chroma_database: "db".to_string(),
            openai_api_key: "sk-secret".to_string(),
            anthropic_api_key: "sk-ant-secret".to_string(),
        });

        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("tenant"));
    }

    #[test]
    fn test_diagnostic_line_names_store() {
        assert_eq!(
            BackendTag::Vector.diagnostic_line(),
            "Using chroma storage with Anthropic AI"
        );
        assert!(BackendTag::Relational.diagnostic_line().contains("sqlite"));
    }
}
