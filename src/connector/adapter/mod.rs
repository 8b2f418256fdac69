mod chroma_task_example_store;
pub(crate) mod keyword;
mod llm_query_expander;
mod openai_embedding;
mod sqlite_task_example_store;

pub use chroma_task_example_store::*;
pub use llm_query_expander::*;
pub use openai_embedding::*;
pub use sqlite_task_example_store::*;
