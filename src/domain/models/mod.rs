mod backend_config;
mod task_example;

pub use backend_config::*;
pub use task_example::*;
