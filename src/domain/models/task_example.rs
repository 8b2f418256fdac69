use std::fmt;

use serde::{Deserialize, Serialize};

/// A task description paired with a known-good solution or trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExample {
    task: String,
    solution: String,
    #[serde(default)]
    tags: Vec<String>,
}

impl TaskExample {
    pub fn new(task: impl Into<String>, solution: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            solution: solution.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn solution(&self) -> &str {
        &self.solution
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Text handed to embedding models: the task first, then the solution.
    pub fn document(&self) -> String {
        format!("{}\n\n{}", self.task, self.solution)
    }
}

/// Identifier assigned by a backend when an example is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredId(String);

impl StoredId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoredId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored example with its backend-defined relevance to a query.
///
/// Scores are only comparable between results of the same adapter instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredExample {
    id: StoredId,
    example: TaskExample,
    score: f32,
}

impl ScoredExample {
    pub fn new(id: StoredId, example: TaskExample, score: f32) -> Self {
        Self { id, example, score }
    }

    pub fn id(&self) -> &StoredId {
        &self.id
    }

    pub fn example(&self) -> &TaskExample {
        &self.example
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn into_parts(self) -> (TaskExample, f32) {
        (self.example, self.score)
    }

    pub fn display_line(&self) -> String {
        format!("{} (score: {:.3})", self.id, self.score)
    }
}

/// Sort by descending score and cut to `limit`.
pub fn rank_by_score(mut results: Vec<ScoredExample>, limit: usize) -> Vec<ScoredExample> {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(limit);
    results
}
