mod embedding_service;
mod query_expander;
mod task_example_storage;

pub use embedding_service::*;
pub use query_expander::*;
pub use task_example_storage::*;
