use std::fmt;

use thiserror::Error;

/// Per-operation and construction failures raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StorageError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    pub fn write(msg: impl Into<String>) -> Self {
        Self::WriteFailed(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryFailed(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }

    pub fn is_write_failed(&self) -> bool {
        matches!(self, Self::WriteFailed(_))
    }

    pub fn is_query_failed(&self) -> bool {
        matches!(self, Self::QueryFailed(_))
    }
}

/// Why a required configuration key was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Missing,
    Empty,
}

impl Requirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "is not set",
            Self::Empty => "must not be empty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    key: &'static str,
    requirement: Requirement,
}

impl FieldViolation {
    pub fn new(key: &'static str, requirement: Requirement) -> Self {
        Self { key, requirement }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn requirement(&self) -> Requirement {
        self.requirement
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key, self.requirement.as_str())
    }
}

/// Neither configuration shape validated. Carries the violations of both
/// attempts so the operator can tell which shape came closest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Environment validation failed. Please provide either:\n\
     1. Chroma config: CHROMA_API_KEY, CHROMA_TENANT, CHROMA_DATABASE, OPENAI_API_KEY, ANTHROPIC_API_KEY\n\
     2. SQLite config: SQLITE_PATH, ANTHROPIC_API_KEY\n\n\
     Chroma validation error: {}\n\
     SQLite validation error: {}",
    join_violations(.vector),
    join_violations(.relational)
)]
pub struct ConfigurationError {
    pub vector: Vec<FieldViolation>,
    pub relational: Vec<FieldViolation>,
}

impl ConfigurationError {
    pub fn new(vector: Vec<FieldViolation>, relational: Vec<FieldViolation>) -> Self {
        Self { vector, relational }
    }

    /// Number of unmet requirements per shape as `(vector, relational)`.
    pub fn violation_counts(&self) -> (usize, usize) {
        (self.vector.len(), self.relational.len())
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The single fatal error path of process startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Backend(#[from] StorageError),
}

impl StartupError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
