use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::application::{QueryExpander, TaskExampleStorage};
use crate::connector::adapter::keyword::tokenize;
use crate::domain::{rank_by_score, ScoredExample, StorageError, StoredId, TaskExample};

const SCHEMA_VERSION: i64 = 2;

/// Weight of a query term found only in the solution or tags.
const SECONDARY_MATCH_WEIGHT: f32 = 0.5;

/// SQLite-backed task example store.
///
/// Relevance is keyword overlap: the fraction of query terms that appear in
/// the task description, with terms matched only by the solution or tags
/// counting half.
pub struct SqliteTaskExampleStore {
    conn: Arc<Mutex<Connection>>,
    query_expander: Option<Arc<dyn QueryExpander>>,
}

struct StoredRow {
    id: String,
    task: String,
    solution: String,
    tags: String,
    created_at: i64,
}

impl SqliteTaskExampleStore {
    /// Open (or create) the database at `db_path`.
    ///
    /// Fails with [`StorageError::BackendUnavailable`] when the file cannot be
    /// opened for writing.
    pub async fn new(db_path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::unavailable(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| {
            StorageError::unavailable(format!(
                "Failed to open database {}: {}",
                db_path.display(),
                e
            ))
        })?;

        let storage = Self::with_connection(conn);
        storage.initialize_schema().await?;
        debug!("Opened SQLite task store at {}", db_path.display());
        Ok(storage)
    }

    pub async fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            StorageError::unavailable(format!("Failed to create in-memory database: {}", e))
        })?;

        let storage = Self::with_connection(conn);
        storage.initialize_schema().await?;
        Ok(storage)
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            query_expander: None,
        }
    }

    pub fn with_query_expander(mut self, expander: Arc<dyn QueryExpander>) -> Self {
        self.query_expander = Some(expander);
        self
    }

    async fn initialize_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().await;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS task_examples (
                id TEXT PRIMARY KEY,
                task TEXT NOT NULL,
                solution TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                search_text TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_task_examples_created_at
                ON task_examples (created_at);
            "#,
        )
        .map_err(|e| StorageError::unavailable(format!("Failed to initialize schema: {}", e)))?;

        Self::backfill_search_text(&conn)?;

        // Writing the header fails on a read-only database, which is what we
        // want to surface at startup.
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(|e| StorageError::unavailable(format!("Database is not writable: {}", e)))?;

        debug!("Database schema initialized");
        Ok(())
    }

    /// Add and fill the `search_text` column on databases created before it
    /// existed.
    fn backfill_search_text(conn: &Connection) -> Result<(), StorageError> {
        if conn
            .prepare("SELECT search_text FROM task_examples LIMIT 0")
            .is_ok()
        {
            return Ok(());
        }

        let migrate = |e: rusqlite::Error| {
            StorageError::unavailable(format!("Failed to migrate schema: {}", e))
        };

        conn.execute(
            "ALTER TABLE task_examples ADD COLUMN search_text TEXT NOT NULL DEFAULT ''",
            [],
        )
        .map_err(migrate)?;

        let rows = {
            let mut stmt = conn
                .prepare("SELECT id, task, solution, tags FROM task_examples")
                .map_err(migrate)?;
            let rows = stmt
                .query_map([], |row| {
                    let task: String = row.get(1)?;
                    let solution: String = row.get(2)?;
                    let tags: String = row.get(3)?;
                    Ok((row.get::<_, String>(0)?, search_text(&task, &solution, &tags)))
                })
                .map_err(migrate)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(migrate)?
        };

        for (id, text) in &rows {
            conn.execute(
                "UPDATE task_examples SET search_text = ?1 WHERE id = ?2",
                params![text, id],
            )
            .map_err(migrate)?;
        }

        debug!("Backfilled search text for {} task examples", rows.len());
        Ok(())
    }

    async fn query_terms(&self, query: &str) -> Vec<String> {
        let variants = match self.query_expander {
            Some(ref expander) => match expander.expand(query).await {
                Ok(variants) => variants,
                Err(e) => {
                    warn!("Query expansion failed: {}. Using original query.", e);
                    vec![query.to_string()]
                }
            },
            None => vec![query.to_string()],
        };

        let mut seen = HashSet::new();
        variants
            .iter()
            .flat_map(|v| tokenize(v))
            .filter(|term| seen.insert(term.clone()))
            .collect()
    }

    async fn load_candidates(&self, terms: &[String]) -> Result<Vec<StoredRow>, StorageError> {
        let conn = self.conn.lock().await;

        let clauses = (1..=terms.len())
            .map(|i| format!("search_text LIKE ?{}", i))
            .collect::<Vec<_>>()
            .join(" OR ");
        let sql = format!(
            "SELECT id, task, solution, tags, created_at FROM task_examples WHERE {}",
            clauses
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StorageError::query(format!("Failed to prepare statement: {}", e)))?;

        let patterns = terms.iter().map(|t| format!("%{}%", t));
        let rows = stmt
            .query_map(params_from_iter(patterns), |row| {
                Ok(StoredRow {
                    id: row.get(0)?,
                    task: row.get(1)?,
                    solution: row.get(2)?,
                    tags: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })
            .map_err(|e| StorageError::query(format!("Failed to query task examples: {}", e)))?;

        let mut candidates = Vec::new();
        for row in rows {
            candidates
                .push(row.map_err(|e| StorageError::query(format!("Failed to read row: {}", e)))?);
        }

        Ok(candidates)
    }
}

/// Lowercased text the candidate filter matches against. SQLite's `lower()`
/// and `LIKE` only fold ASCII, so folding happens here with the same rules
/// as [`tokenize`].
fn search_text(task: &str, solution: &str, tags: &str) -> String {
    format!("{} {} {}", task, solution, tags).to_lowercase()
}

fn score_row(terms: &[String], task: &str, secondary: &str) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }

    let task_terms: HashSet<String> = tokenize(task).into_iter().collect();
    let secondary_terms: HashSet<String> = tokenize(secondary).into_iter().collect();

    let total: f32 = terms
        .iter()
        .map(|term| {
            if task_terms.contains(term) {
                1.0
            } else if secondary_terms.contains(term) {
                SECONDARY_MATCH_WEIGHT
            } else {
                0.0
            }
        })
        .sum();

    total / terms.len() as f32
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[async_trait]
impl TaskExampleStorage for SqliteTaskExampleStore {
    async fn store(&self, example: &TaskExample) -> Result<StoredId, StorageError> {
        let id = StoredId::generate();
        let tags = serde_json::to_string(example.tags())
            .map_err(|e| StorageError::write(format!("Failed to encode tags: {}", e)))?;

        let text = search_text(example.task(), example.solution(), &tags);

        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO task_examples (id, task, solution, tags, search_text, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                id.as_str(),
                example.task(),
                example.solution(),
                tags,
                text,
                now_millis()
            ],
        )
        .map_err(|e| StorageError::write(format!("Failed to save task example: {}", e)))?;

        debug!("Saved task example {}", id);
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

        let terms = self.query_terms(query).await;
        if terms.is_empty() {
            debug!("Query has no searchable terms");
            return Ok(Vec::new());
        }

        let mut candidates = self.load_candidates(&terms).await?;
        // Most recent first so the stable sort keeps newer examples ahead on ties.
        candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut results = Vec::with_capacity(candidates.len());
        for row in candidates {
            let tags: Vec<String> = serde_json::from_str(&row.tags).map_err(|e| {
                StorageError::query(format!("Corrupt tags for task example {}: {}", row.id, e))
            })?;
            let secondary = format!("{} {}", row.solution, tags.join(" "));
            let score = score_row(&terms, &row.task, &secondary);
            if score <= 0.0 {
                continue;
            }

            let example = TaskExample::new(row.task, row.solution).with_tags(tags);
            results.push(ScoredExample::new(
                StoredId::from_string(row.id),
                example,
                score,
            ));
        }

        Ok(rank_by_score(results, limit))
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM task_examples", [], |row| row.get(0))
            .map_err(|e| StorageError::query(format!("Failed to count task examples: {}", e)))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_score_weights_task_over_solution() {
        let query = terms(&["retry", "http"]);

        let task_hit = score_row(&query, "Retry failed HTTP calls", "");
        let solution_hit = score_row(&query, "Make calls robust", "retry with http backoff");

        assert_eq!(task_hit, 1.0);
        assert_eq!(solution_hit, 0.5);
    }

    #[test]
    fn test_score_zero_without_overlap() {
        assert_eq!(score_row(&terms(&["kubernetes"]), "Parse CSV", "csv crate"), 0.0);
    }

    #[tokio::test]
    async fn test_zero_limit_returns_nothing() {
        let store = SqliteTaskExampleStore::in_memory().await.unwrap();
        store
            .store(&TaskExample::new("Parse CSV", "use csv"))
            .await
            .unwrap();

        let results = store.find_relevant("csv", 0).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_tags_round_trip_through_search() {
        let store = SqliteTaskExampleStore::in_memory().await.unwrap();
        let example = TaskExample::new("Bump crate version", "Edit Cargo.toml")
            .with_tags(vec!["release".to_string(), "cargo".to_string()]);
        store.store(&example).await.unwrap();

        let results = store.find_relevant("release", 5).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].example(), &example);
        assert_eq!(results[0].score(), 0.5);
    }

    #[tokio::test]
    async fn test_finds_uppercase_non_ascii_terms() {
        let store = SqliteTaskExampleStore::in_memory().await.unwrap();
        store
            .store(&TaskExample::new("ÜBERSICHT erstellen", "x"))
            .await
            .unwrap();

        let same_case = store.find_relevant("ÜBERSICHT", 3).await.unwrap();
        let lower_case = store.find_relevant("übersicht", 3).await.unwrap();

        assert_eq!(same_case.len(), 1);
        assert_eq!(lower_case.len(), 1);
        assert_eq!(lower_case[0].score(), 1.0);
    }

    #[tokio::test]
    async fn test_corrupt_tags_fail_the_query() {
        let store = SqliteTaskExampleStore::in_memory().await.unwrap();
        let id = store
            .store(&TaskExample::new("Parse CSV", "use csv"))
            .await
            .unwrap();
        store
            .conn
            .lock()
            .await
            .execute(
                "UPDATE task_examples SET tags = 'not json' WHERE id = ?1",
                params![id.as_str()],
            )
            .unwrap();

        let err = store.find_relevant("csv", 3).await.unwrap_err();
        assert!(err.is_query_failed());
    }

    #[tokio::test]
    async fn test_backfills_search_text_on_older_schema() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE task_examples (
                id TEXT PRIMARY KEY,
                task TEXT NOT NULL,
                solution TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                created_at INTEGER NOT NULL
            );
            INSERT INTO task_examples VALUES ('old', 'Größe ÄNDERN', 'resize', '[]', 1);
            "#,
        )
        .unwrap();

        let store = SqliteTaskExampleStore::with_connection(conn);
        store.initialize_schema().await.unwrap();

        let results = store.find_relevant("ändern", 3).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id().as_str(), "old");
    }
}
