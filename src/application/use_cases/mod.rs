mod find_relevant_examples;
mod store_task_example;

pub use find_relevant_examples::*;
pub use store_task_example::*;
