//! Backend selection from an environment snapshot.

use task_recall::{resolve, BackendConfig, BackendTag, EnvSnapshot, Requirement};

fn vector_pairs() -> Vec<(&'static str, &'static str)> {
    vec![
        ("CHROMA_API_KEY", "k"),
        ("CHROMA_TENANT", "t"),
        ("CHROMA_DATABASE", "d"),
        ("OPENAI_API_KEY", "o"),
        ("ANTHROPIC_API_KEY", "a"),
    ]
}

#[test]
fn vector_shape_resolves_with_exact_values() {
    let snapshot = EnvSnapshot::from_pairs(vector_pairs());

    let resolved = resolve(&snapshot).expect("vector shape should validate");

    assert_eq!(resolved.tag(), BackendTag::Vector);
    assert_eq!(resolved.tag().as_str(), "vector");
    match resolved.config() {
        BackendConfig::Vector(config) => {
            assert_eq!(config.chroma_api_key, "k");
            assert_eq!(config.chroma_tenant, "t");
            assert_eq!(config.chroma_database, "d");
            assert_eq!(config.openai_api_key, "o");
            assert_eq!(config.anthropic_api_key, "a");
        }
        other => panic!("expected vector config, got {:?}", other),
    }
    assert!(resolved.tag().diagnostic_line().contains("chroma"));
}

#[test]
fn relational_shape_resolves() {
    let snapshot =
        EnvSnapshot::from_pairs([("SQLITE_PATH", "/tmp/db.sqlite"), ("ANTHROPIC_API_KEY", "a")]);

    let resolved = resolve(&snapshot).expect("relational shape should validate");

    assert_eq!(resolved.tag(), BackendTag::Relational);
    match resolved.config() {
        BackendConfig::Relational(config) => {
            assert_eq!(config.sqlite_path, "/tmp/db.sqlite");
            assert_eq!(config.anthropic_api_key, "a");
        }
        other => panic!("expected relational config, got {:?}", other),
    }
}

#[test]
fn vector_wins_when_both_shapes_validate() {
    let mut pairs = vector_pairs();
    pairs.push(("SQLITE_PATH", "/tmp/db.sqlite"));
    let snapshot = EnvSnapshot::from_pairs(pairs);

    let resolved = resolve(&snapshot).unwrap();

    assert_eq!(resolved.tag(), BackendTag::Vector);
}

#[test]
fn neither_shape_reports_violations_from_both() {
    let snapshot = EnvSnapshot::from_pairs([("ANTHROPIC_API_KEY", "a")]);

    let err = resolve(&snapshot).expect_err("no shape should validate");

    let vector_keys: Vec<&str> = err.vector.iter().map(|v| v.key()).collect();
    let relational_keys: Vec<&str> = err.relational.iter().map(|v| v.key()).collect();
    assert_eq!(
        vector_keys,
        vec!["CHROMA_API_KEY", "CHROMA_TENANT", "CHROMA_DATABASE", "OPENAI_API_KEY"]
    );
    assert_eq!(relational_keys, vec!["SQLITE_PATH"]);

    let message = err.to_string();
    assert!(message.contains("CHROMA_TENANT is not set"));
    assert!(message.contains("SQLITE_PATH is not set"));
}

#[test]
fn empty_value_is_treated_as_absent() {
    let mut pairs = vector_pairs();
    pairs.retain(|(k, _)| *k != "CHROMA_DATABASE");
    pairs.push(("CHROMA_DATABASE", ""));
    let snapshot = EnvSnapshot::from_pairs(pairs);

    let err = resolve(&snapshot).expect_err("empty database id must not validate");

    assert_eq!(err.vector.len(), 1);
    assert_eq!(err.vector[0].key(), "CHROMA_DATABASE");
    assert_eq!(err.vector[0].requirement(), Requirement::Empty);
}

#[test]
fn empty_shared_key_fails_both_shapes() {
    let mut pairs = vector_pairs();
    pairs.retain(|(k, _)| *k != "ANTHROPIC_API_KEY");
    pairs.push(("ANTHROPIC_API_KEY", ""));
    pairs.push(("SQLITE_PATH", "/tmp/db.sqlite"));
    let snapshot = EnvSnapshot::from_pairs(pairs);

    let err = resolve(&snapshot).unwrap_err();

    assert!(err.vector.iter().any(|v| v.key() == "ANTHROPIC_API_KEY"));
    assert!(err.relational.iter().any(|v| v.key() == "ANTHROPIC_API_KEY"));
}

#[test]
fn error_message_never_echoes_values() {
    let snapshot = EnvSnapshot::from_pairs([
        ("CHROMA_API_KEY", "super-secret-chroma"),
        ("OPENAI_API_KEY", "super-secret-openai"),
    ]);

    let message = resolve(&snapshot).unwrap_err().to_string();

    assert!(!message.contains("super-secret"));
}

#[test]
fn resolution_is_idempotent() {
    let snapshot = EnvSnapshot::from_pairs(vector_pairs());

    let first = resolve(&snapshot).unwrap();
    let second = resolve(&snapshot).unwrap();

    assert_eq!(first, second);

    let empty = EnvSnapshot::default();
    assert_eq!(resolve(&empty).unwrap_err(), resolve(&empty).unwrap_err());
}
