//! End-to-end startup: snapshot to live storage handle.

use task_recall::{EnvSnapshot, StartupError, StorageFactory, TaskExample};
use tempfile::tempdir;

// Keeps the query expander off the network.
const OFFLINE_ANTHROPIC: (&str, &str) = ("ANTHROPIC_BASE_URL", "http://127.0.0.1:9");

#[tokio::test]
async fn relational_snapshot_builds_working_storage() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("db.sqlite");
    let snapshot = EnvSnapshot::from_pairs([
        ("SQLITE_PATH", db_path.to_string_lossy().to_string()),
        ("ANTHROPIC_API_KEY", "a".to_string()),
        (OFFLINE_ANTHROPIC.0, OFFLINE_ANTHROPIC.1.to_string()),
    ]);

    let storage = StorageFactory::build(&snapshot).await.expect("build");

    storage
        .store(&TaskExample::new(
            "Add a GitHub Actions cache",
            "Use actions/cache keyed by Cargo.lock",
        ))
        .await
        .expect("store");
    let results = storage
        .find_relevant("cache github actions", 3)
        .await
        .expect("find_relevant");

    assert_eq!(results.len(), 1);
    assert!(db_path.exists());
}

#[tokio::test]
async fn missing_configuration_is_a_startup_error() {
    let snapshot = EnvSnapshot::from_pairs([("ANTHROPIC_API_KEY", "a")]);

    let err = StorageFactory::build(&snapshot).await.err().expect("must fail");

    assert!(err.is_configuration());
    let message = err.to_string();
    assert!(message.contains("CHROMA_API_KEY"));
    assert!(message.contains("SQLITE_PATH"));
}

#[tokio::test]
async fn unreachable_vector_backend_does_not_fall_back() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("db.sqlite");
    let snapshot = EnvSnapshot::from_pairs([
        ("CHROMA_API_KEY", "k".to_string()),
        ("CHROMA_TENANT", "t".to_string()),
        ("CHROMA_DATABASE", "d".to_string()),
        ("OPENAI_API_KEY", "o".to_string()),
        ("ANTHROPIC_API_KEY", "a".to_string()),
        ("CHROMA_URL", "http://127.0.0.1:9".to_string()),
        ("SQLITE_PATH", db_path.to_string_lossy().to_string()),
        (OFFLINE_ANTHROPIC.0, OFFLINE_ANTHROPIC.1.to_string()),
    ]);

    let err = StorageFactory::build(&snapshot).await.err().expect("must fail");

    match err {
        StartupError::Backend(e) => assert!(e.is_backend_unavailable()),
        other => panic!("expected backend error, got {}", other),
    }
    assert!(!db_path.exists(), "relational store must not be built as a fallback");
}

#[tokio::test]
async fn building_twice_yields_independent_handles() {
    let dir = tempdir().expect("tempdir");
    let snapshot = EnvSnapshot::from_pairs([
        ("SQLITE_PATH", dir.path().join("db.sqlite").to_string_lossy().to_string()),
        ("ANTHROPIC_API_KEY", "a".to_string()),
    ]);

    let first = StorageFactory::build(&snapshot).await.expect("first build");
    let second = StorageFactory::build(&snapshot).await.expect("second build");

    first
        .store(&TaskExample::new("Shared file", "both handles see it"))
        .await
        .unwrap();

    assert_eq!(second.count().await.unwrap(), 1);
}
