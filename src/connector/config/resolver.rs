use crate::domain::{
    BackendConfig, ConfigurationError, FieldViolation, RelationalBackendConfig, Requirement,
    ResolvedConfig, VectorBackendConfig,
};

use super::EnvSnapshot;

pub const CHROMA_API_KEY: &str = "CHROMA_API_KEY";
pub const CHROMA_TENANT: &str = "CHROMA_TENANT";
pub const CHROMA_DATABASE: &str = "CHROMA_DATABASE";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const SQLITE_PATH: &str = "SQLITE_PATH";

/// Pick the backend configuration satisfied by `snapshot`.
///
/// The vector shape is tried first and wins whenever it fully validates, even
/// if the relational shape validates too. When neither validates the error
/// carries the violations of both attempts.
pub fn resolve(snapshot: &EnvSnapshot) -> Result<ResolvedConfig, ConfigurationError> {
    let vector_violations = match validate_vector(snapshot) {
        Ok(config) => return Ok(ResolvedConfig::new(BackendConfig::Vector(config))),
        Err(violations) => violations,
    };

    let relational_violations = match validate_relational(snapshot) {
        Ok(config) => return Ok(ResolvedConfig::new(BackendConfig::Relational(config))),
        Err(violations) => violations,
    };

    Err(ConfigurationError::new(
        vector_violations,
        relational_violations,
    ))
}

fn validate_vector(snapshot: &EnvSnapshot) -> Result<VectorBackendConfig, Vec<FieldViolation>> {
    let mut violations = Vec::new();

    let chroma_api_key = require(snapshot, CHROMA_API_KEY, &mut violations);
    let chroma_tenant = require(snapshot, CHROMA_TENANT, &mut violations);
    let chroma_database = require(snapshot, CHROMA_DATABASE, &mut violations);
    let openai_api_key = require(snapshot, OPENAI_API_KEY, &mut violations);
    let anthropic_api_key = require(snapshot, ANTHROPIC_API_KEY, &mut violations);

    match (
        chroma_api_key,
        chroma_tenant,
        chroma_database,
        openai_api_key,
        anthropic_api_key,
    ) {
        (
            Some(chroma_api_key),
            Some(chroma_tenant),
            Some(chroma_database),
            Some(openai_api_key),
            Some(anthropic_api_key),
        ) => Ok(VectorBackendConfig {
            chroma_api_key,
            chroma_tenant,
            chroma_database,
            openai_api_key,
            anthropic_api_key,
        }),
        _ => Err(violations),
    }
}

fn validate_relational(
    snapshot: &EnvSnapshot,
) -> Result<RelationalBackendConfig, Vec<FieldViolation>> {
    let mut violations = Vec::new();

    let sqlite_path = require(snapshot, SQLITE_PATH, &mut violations);
    let anthropic_api_key = require(snapshot, ANTHROPIC_API_KEY, &mut violations);

    match (sqlite_path, anthropic_api_key) {
        (Some(sqlite_path), Some(anthropic_api_key)) => Ok(RelationalBackendConfig {
            sqlite_path,
            anthropic_api_key,
        }),
        _ => Err(violations),
    }
}

fn require(
    snapshot: &EnvSnapshot,
    key: &'static str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    match snapshot.get(key) {
        None => {
            violations.push(FieldViolation::new(key, Requirement::Missing));
            None
        }
        Some("") => {
            violations.push(FieldViolation::new(key, Requirement::Empty));
            None
        }
        Some(value) => Some(value.to_string()),
    }
}
